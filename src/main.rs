//! `adminport` binary: connect to an admin port and log what the server
//! reports until interrupted.

mod cli;

use std::{error::Error, net::SocketAddr, process::ExitCode};

use adminport::{
    client::{AdminClient, ClientError},
    packet::{
        AdminUpdateFrequency,
        ServerBanned,
        ServerChat,
        ServerClientInfo,
        ServerClientQuit,
        ServerConsole,
        ServerError,
        ServerFull,
        ServerShutdown,
        ServerWelcome,
        UpdateType,
        frequency,
    },
    routing::{HandlerRegistry, RegistryError},
    session::Credentials,
};
use clap::Parser;

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "adminport failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: cli::Cli) -> Result<(), BoxError> {
    if let Some(addr) = cli.metrics_addr {
        install_metrics_exporter(addr)?;
    }

    let client = AdminClient::builder()
        .credentials(credentials(&cli))
        .handlers(handlers()?)
        .max_packet_size(cli.max_packet_size)
        .nodelay(cli.nodelay)
        .on_error(|err: &ClientError| {
            let message = err.to_string();
            async move { tracing::warn!(error = %message, "admin client error") }
        })
        .connect_host(&cli.host, cli.port)
        .await?;
    let handle = client.handle();
    let mut session = tokio::spawn(client.run());

    tokio::select! {
        finished = &mut session => {
            let reason = finished??;
            tracing::info!(%reason, "session ended");
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("interrupted, disconnecting");
            handle.disconnect()?;
        }
    }

    let reason = session.await??;
    tracing::info!(%reason, "session ended");
    Ok(())
}

fn credentials(cli: &cli::Cli) -> Credentials {
    let mut credentials = Credentials::new();
    if let Some(password) = &cli.password {
        credentials = credentials.password(password.clone());
    }
    if let Some(name) = &cli.name {
        credentials = credentials.name(name.clone());
    }
    if let Some(version) = &cli.client_version {
        credentials = credentials.version(version.clone());
    }
    credentials
}

fn handlers() -> Result<HandlerRegistry, RegistryError> {
    HandlerRegistry::new()
        .on::<ServerWelcome, _>(|ctx, welcome| {
            tracing::info!(
                server = %welcome.server_name,
                map = %welcome.map_name,
                version = %welcome.generation_version,
                "joined server"
            );
            for update in [UpdateType::Chat, UpdateType::Console, UpdateType::ClientInfo] {
                ctx.send(AdminUpdateFrequency::new(update, frequency::AUTOMATIC));
            }
            Ok(())
        })?
        .on::<ServerChat, _>(|_, chat| {
            tracing::info!(client = chat.client_id, message = %chat.message, "chat");
            Ok(())
        })?
        .on::<ServerConsole, _>(|_, console| {
            tracing::info!(origin = %console.origin, message = %console.message, "console");
            Ok(())
        })?
        .on::<ServerClientInfo, _>(|_, info| {
            tracing::info!(
                client = info.client_id,
                name = %info.name,
                address = %info.address,
                "client info"
            );
            Ok(())
        })?
        .on::<ServerClientQuit, _>(|_, quit| {
            tracing::info!(client = quit.client_id, "client quit");
            Ok(())
        })?
        .on::<ServerShutdown, _>(|ctx, _| {
            tracing::info!("server is shutting down");
            ctx.disconnect();
            Ok(())
        })?
        .on::<ServerFull, _>(|_, _| {
            tracing::warn!("server refused the connection: full");
            Ok(())
        })?
        .on::<ServerBanned, _>(|_, _| {
            tracing::warn!("server refused the connection: banned");
            Ok(())
        })?
        .on::<ServerError, _>(|_, error| {
            tracing::warn!(code = error.error, "server reported an error");
            Ok(())
        })
}

#[cfg(feature = "metrics")]
fn install_metrics_exporter(addr: SocketAddr) -> Result<(), BoxError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(%addr, "serving metrics");
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics_exporter(addr: SocketAddr) -> Result<(), BoxError> {
    tracing::warn!(%addr, "built without the metrics feature; not serving metrics");
    Ok(())
}
