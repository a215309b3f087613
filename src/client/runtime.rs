//! Admin port client runtime.

use std::{fmt, time::Duration};

use bytes::BytesMut;
use tokio::{
    io::AsyncReadExt,
    net::tcp::OwnedReadHalf,
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, sleep_until},
};

use super::{AdminClientBuilder, ClientError, ClientErrorHandler, writer::ChannelTransport};
use crate::{
    packet::Packet,
    session::{CloseReason, Phase, Session, SessionError},
};

const READ_CHUNK: usize = 4 * 1024;

pub(crate) enum Command {
    Send(Packet),
    Disconnect,
}

/// Cloneable handle for talking to a running [`AdminClient`].
#[derive(Clone, Debug)]
pub struct ClientHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl ClientHandle {
    /// Queue `packet` for the session to send.
    ///
    /// Encoding and phase errors are reported through the client's error
    /// hook, not here.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Stopped`] once the client has finished.
    pub fn send(&self, packet: impl Into<Packet>) -> Result<(), ClientError> {
        self.tx
            .send(Command::Send(packet.into()))
            .map_err(|_| ClientError::Stopped)
    }

    /// Ask the session to disconnect.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Stopped`] once the client has finished.
    pub fn disconnect(&self) -> Result<(), ClientError> {
        self.tx
            .send(Command::Disconnect)
            .map_err(|_| ClientError::Stopped)
    }

    /// Returns true once the client has finished.
    #[must_use]
    pub fn is_stopped(&self) -> bool { self.tx.is_closed() }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send(packet) => f.debug_tuple("Send").field(&packet.name()).finish(),
            Self::Disconnect => f.write_str("Disconnect"),
        }
    }
}

/// A connected admin port session driven over TCP.
///
/// [`run`](Self::run) reads from the socket and feeds the session until it
/// closes. Packets are sent through [`ClientHandle`]s from other tasks or
/// from handlers via their context.
pub struct AdminClient {
    pub(crate) session: Session<ChannelTransport>,
    pub(crate) reader: OwnedReadHalf,
    pub(crate) writer: JoinHandle<std::io::Result<()>>,
    pub(crate) commands_tx: mpsc::UnboundedSender<Command>,
    pub(crate) commands: mpsc::UnboundedReceiver<Command>,
    pub(crate) close_timeout: Duration,
    pub(crate) on_error: Option<ClientErrorHandler>,
}

impl fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminClient")
            .field("session", &self.session)
            .field("close_timeout", &self.close_timeout)
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Start building a client.
    #[must_use]
    pub fn builder() -> AdminClientBuilder { AdminClientBuilder::new() }

    /// A handle for sending packets and disconnecting.
    #[must_use]
    pub fn handle(&self) -> ClientHandle {
        ClientHandle {
            tx: self.commands_tx.clone(),
        }
    }

    /// Current session phase.
    #[must_use]
    pub fn phase(&self) -> Phase { self.session.phase() }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &Session<ChannelTransport> { &self.session }

    /// Drive the session until it closes.
    ///
    /// Handler failures and rejected sends are logged, passed to the error
    /// hook and do not stop the client. Packets buffered behind a failing
    /// handler are routed afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::WriterTask`] if the socket writer panicked.
    /// Connection loss and malformed streams are normal outcomes reported
    /// through the returned [`CloseReason`].
    pub async fn run(mut self) -> Result<CloseReason, ClientError> {
        let mut buf = BytesMut::with_capacity(READ_CHUNK);
        let mut close_deadline = None;

        while !self.session.phase().is_closed() {
            if self.session.phase() == Phase::Closing && close_deadline.is_none() {
                close_deadline = Some(Instant::now() + self.close_timeout);
            }
            buf.reserve(READ_CHUNK);
            tokio::select! {
                read = self.reader.read_buf(&mut buf) => match read {
                    Ok(0) => self.session.on_transport_closed(None),
                    Ok(_) => {
                        self.feed(&buf).await;
                        buf.clear();
                    }
                    Err(err) => self.session.on_transport_closed(Some(err)),
                },
                Some(command) = self.commands.recv() => self.execute(command).await,
                () = wait_until(close_deadline) => {
                    tracing::warn!(timeout = ?self.close_timeout, "server did not close the connection in time");
                    self.session.on_transport_closed(None);
                }
            }
        }

        let reason = self
            .session
            .into_close_reason()
            .unwrap_or(CloseReason::Lost(None));
        if let Err(err) = self.writer.await? {
            tracing::debug!(error = %err, "socket writer stopped with an error");
        }
        Ok(reason)
    }

    async fn feed(&mut self, bytes: &[u8]) {
        let mut result = self.session.receive(bytes);
        while let Err(err) = result {
            let resume = matches!(err, SessionError::Handler { .. })
                && self.session.phase().accepts_frames();
            if !matches!(err, SessionError::Codec(_)) {
                report(self.on_error.clone(), err.into()).await;
            }
            if !resume {
                break;
            }
            result = self.session.receive(&[]);
        }
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Send(packet) => {
                if let Err(err) = self.session.send(&packet) {
                    tracing::warn!(packet = packet.name(), error = %err, "failed to send packet");
                    report(self.on_error.clone(), err.into()).await;
                }
            }
            Command::Disconnect => self.session.disconnect(),
        }
    }
}

async fn report(handler: Option<ClientErrorHandler>, error: ClientError) {
    if let Some(handler) = handler {
        handler(&error).await;
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
