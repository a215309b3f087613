//! Socket options for admin port clients.

use std::{io, time::Duration};

use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpSocket;

/// How long to wait for the server to close after a disconnect before
/// treating the connection as closed.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Options applied to the socket before connecting.
///
/// Unset options keep the operating system defaults.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use adminport::client::SocketOptions;
///
/// let options = SocketOptions::default()
///     .nodelay(true)
///     .keepalive(Some(Duration::from_secs(60)));
/// assert_eq!(options.nodelay_value(), Some(true));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SocketOptions {
    nodelay: Option<bool>,
    keepalive: Option<Option<Duration>>,
    linger: Option<Option<Duration>>,
    send_buffer_size: Option<u32>,
    recv_buffer_size: Option<u32>,
}

impl SocketOptions {
    /// Set `TCP_NODELAY`.
    #[must_use]
    pub fn nodelay(mut self, enabled: bool) -> Self {
        self.nodelay = Some(enabled);
        self
    }

    /// Enable TCP keepalive with the given idle time, or disable it with
    /// `None`.
    #[must_use]
    pub fn keepalive(mut self, idle: Option<Duration>) -> Self {
        self.keepalive = Some(idle);
        self
    }

    /// Set `SO_LINGER`, or clear it with `None`.
    #[must_use]
    pub fn linger(mut self, duration: Option<Duration>) -> Self {
        self.linger = Some(duration);
        self
    }

    /// Set the socket send buffer size.
    #[must_use]
    pub fn send_buffer_size(mut self, size: u32) -> Self {
        self.send_buffer_size = Some(size);
        self
    }

    /// Set the socket receive buffer size.
    #[must_use]
    pub fn recv_buffer_size(mut self, size: u32) -> Self {
        self.recv_buffer_size = Some(size);
        self
    }

    /// Configured `TCP_NODELAY` value, if any.
    #[must_use]
    pub fn nodelay_value(&self) -> Option<bool> { self.nodelay }

    pub(crate) fn apply(&self, socket: &TcpSocket) -> io::Result<()> {
        if let Some(enabled) = self.nodelay {
            socket.set_nodelay(enabled)?;
        }
        match self.keepalive {
            Some(Some(idle)) => {
                socket.set_keepalive(true)?;
                SockRef::from(socket).set_tcp_keepalive(&TcpKeepalive::new().with_time(idle))?;
            }
            Some(None) => socket.set_keepalive(false)?,
            None => {}
        }
        if let Some(linger) = self.linger {
            SockRef::from(socket).set_linger(linger)?;
        }
        if let Some(size) = self.send_buffer_size {
            socket.set_send_buffer_size(size)?;
        }
        if let Some(size) = self.recv_buffer_size {
            socket.set_recv_buffer_size(size)?;
        }
        Ok(())
    }
}
