//! Command line interface for the `adminport` binary.

use std::net::SocketAddr;

use clap::Parser;

/// Command line arguments for the `adminport` binary.
#[derive(Debug, Parser)]
#[command(
    name = "adminport",
    version,
    about = "Connect to an OpenTTD admin port and log server events"
)]
pub struct Cli {
    /// Server host name or address.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    /// Admin port of the server.
    #[arg(short, long, default_value_t = 3977)]
    pub port: u16,
    /// Admin port password. Without one the client connects but does not
    /// authenticate.
    #[arg(long, env = "ADMINPORT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Client name reported to the server.
    #[arg(long)]
    pub name: Option<String>,
    /// Client version reported to the server.
    #[arg(long = "client-version")]
    pub client_version: Option<String>,
    /// Disable Nagle's algorithm on the connection.
    #[arg(long)]
    pub nodelay: bool,
    /// Largest packet accepted or sent, header included.
    #[arg(long, default_value_t = 32_767)]
    pub max_packet_size: usize,
    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}
