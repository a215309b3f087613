//! Builder for [`AdminClient`].

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use tokio::{
    net::{TcpSocket, lookup_host},
    sync::mpsc,
};

use super::{
    AdminClient,
    ClientError,
    ClientErrorHandler,
    DEFAULT_CLOSE_TIMEOUT,
    SocketOptions,
    writer::{ChannelTransport, write_frames},
};
use crate::{
    routing::HandlerRegistry,
    session::{CloseReason, Credentials, SessionBuilder},
};

/// Configures and connects an [`AdminClient`].
///
/// # Examples
///
/// ```no_run
/// use adminport::{
///     client::AdminClient,
///     packet::ServerChat,
///     routing::HandlerRegistry,
///     session::Credentials,
/// };
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let handlers = HandlerRegistry::new().on::<ServerChat, _>(|_ctx, chat| {
///     println!("{}", chat.message);
///     Ok(())
/// })?;
/// let client = AdminClient::builder()
///     .credentials(Credentials::new().password("secret"))
///     .handlers(handlers)
///     .nodelay(true)
///     .connect_host("localhost", 3977)
///     .await?;
/// let reason = client.run().await?;
/// println!("closed: {reason}");
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct AdminClientBuilder {
    session: SessionBuilder,
    socket_options: SocketOptions,
    close_timeout: Option<Duration>,
    on_error: Option<ClientErrorHandler>,
}

impl AdminClientBuilder {
    /// Create a builder with default settings.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Credentials used for the join request.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.session = self.session.credentials(credentials);
        self
    }

    /// Handlers that receive routed packets.
    #[must_use]
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.session = self.session.handlers(handlers);
        self
    }

    /// Largest packet accepted or sent, header included.
    #[must_use]
    pub fn max_packet_size(mut self, size: usize) -> Self {
        self.session = self.session.max_packet_size(size);
        self
    }

    /// Register a callback for session closure.
    #[must_use]
    pub fn on_close<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&CloseReason) + Send + 'static,
    {
        self.session = self.session.on_close(hook);
        self
    }

    /// Register a callback for errors the runtime recovers from.
    ///
    /// # Examples
    ///
    /// ```
    /// use adminport::client::AdminClientBuilder;
    ///
    /// let builder = AdminClientBuilder::new().on_error(|err| {
    ///     let message = err.to_string();
    ///     async move { eprintln!("admin client error: {message}") }
    /// });
    /// let _ = builder;
    /// ```
    #[must_use]
    pub fn on_error<F, Fut>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a ClientError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_error = Some(Arc::new(move |err| Box::pin(f(err))));
        self
    }

    /// Replace all socket options.
    #[must_use]
    pub fn socket_options(mut self, options: SocketOptions) -> Self {
        self.socket_options = options;
        self
    }

    /// Set `TCP_NODELAY` on the socket.
    #[must_use]
    pub fn nodelay(mut self, enabled: bool) -> Self {
        self.socket_options = self.socket_options.nodelay(enabled);
        self
    }

    /// Enable TCP keepalive with the given idle time, or disable it.
    #[must_use]
    pub fn keepalive(mut self, idle: Option<Duration>) -> Self {
        self.socket_options = self.socket_options.keepalive(idle);
        self
    }

    /// How long to wait for the server to close after a disconnect.
    ///
    /// Defaults to [`DEFAULT_CLOSE_TIMEOUT`].
    #[must_use]
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = Some(timeout);
        self
    }

    /// Resolve `host` and connect to the first address that accepts.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Resolve`] if the name has no addresses, or the
    /// last connection error if every address fails.
    pub async fn connect_host(self, host: &str, port: u16) -> Result<AdminClient, ClientError> {
        let addrs: Vec<SocketAddr> = lookup_host((host, port)).await?.collect();
        let mut last_err = None;
        for addr in &addrs {
            match open_socket(*addr, &self.socket_options).await {
                Ok(stream) => return self.attach(stream),
                Err(err) => {
                    tracing::debug!(%addr, error = %err, "connection attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.map_or_else(|| ClientError::Resolve(format!("{host}:{port}")), ClientError::Io))
    }

    /// Connect to `addr`.
    ///
    /// The join request is queued before this returns when a password is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if socket configuration or connection fails.
    pub async fn connect(self, addr: SocketAddr) -> Result<AdminClient, ClientError> {
        let stream = open_socket(addr, &self.socket_options).await?;
        self.attach(stream)
    }

    fn attach(self, stream: tokio::net::TcpStream) -> Result<AdminClient, ClientError> {
        let peer_addr = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_frames(writer, frames_rx));

        let mut session = self.session.build();
        session.connect(ChannelTransport::new(peer_addr, frames_tx))?;

        let (commands_tx, commands) = mpsc::unbounded_channel();
        Ok(AdminClient {
            session,
            reader,
            writer,
            commands_tx,
            commands,
            close_timeout: self.close_timeout.unwrap_or(DEFAULT_CLOSE_TIMEOUT),
            on_error: self.on_error,
        })
    }
}

async fn open_socket(
    addr: SocketAddr,
    options: &SocketOptions,
) -> std::io::Result<tokio::net::TcpStream> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    options.apply(&socket)?;
    socket.connect(addr).await
}
