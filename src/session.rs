//! Admin port session state machine.
//!
//! A [`Session`] owns the connection phase, the inbound byte accumulator and
//! the handler registry for one server connection. It performs no I/O: the
//! owner feeds it bytes with [`Session::receive`], reports closure with
//! [`Session::on_transport_closed`], and the session writes through the
//! [`Transport`] it was connected with.
//!
//! ```text
//! Disconnected -> Connected -> Authenticating -> Authenticated
//!       |             |              |                 |
//!       +-------------+--> Closing --+-----------------+--> Closed
//! ```

use std::{fmt, io, net::SocketAddr};

use crate::{
    codec::{CodecError, PacketCodec},
    metrics::{self, Direction},
    packet::{AdminJoin, AdminQuit, Packet},
    routing::HandlerRegistry,
    transport::{CloseProgress, Transport},
};

mod builder;
mod config;
mod error;
mod phase;
mod pump;

pub use builder::{CloseHook, SessionBuilder};
pub use config::{Credentials, DEFAULT_CLIENT_NAME, DEFAULT_CLIENT_VERSION};
pub use error::{CloseReason, Operation, SessionError};
pub use phase::Phase;
pub use pump::Accumulator;

/// One client connection to an admin port.
pub struct Session<T> {
    credentials: Credentials,
    codec: PacketCodec,
    phase: Phase,
    accumulator: Accumulator,
    transport: Option<T>,
    peer_addr: Option<SocketAddr>,
    handlers: HandlerRegistry,
    on_close: Option<CloseHook>,
    close_reason: Option<CloseReason>,
}

impl Session<()> {
    /// Start configuring a session.
    #[must_use]
    pub fn builder() -> SessionBuilder { SessionBuilder::new() }
}

impl<T: Transport> Session<T> {
    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase { self.phase }

    /// Address of the server recorded at connect time.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> { self.peer_addr }

    /// Credentials the session authenticates with.
    #[must_use]
    pub fn credentials(&self) -> &Credentials { &self.credentials }

    /// Codec used to frame packets.
    #[must_use]
    pub fn codec(&self) -> PacketCodec { self.codec }

    /// Registered handlers.
    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry { &self.handlers }

    /// Number of received bytes not yet consumed as frames.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.accumulator.len() }

    /// The attached transport, until the session closes.
    #[must_use]
    pub fn transport(&self) -> Option<&T> { self.transport.as_ref() }

    /// Why the session closed, once it has.
    #[must_use]
    pub fn close_reason(&self) -> Option<&CloseReason> { self.close_reason.as_ref() }

    /// Consume the session, returning its close reason if it has closed.
    #[must_use]
    pub fn into_close_reason(self) -> Option<CloseReason> { self.close_reason }

    /// Attach `transport` and, if a password is configured, send the join
    /// request.
    ///
    /// Ends in [`Phase::Authenticating`] with a password and in
    /// [`Phase::Connected`] without one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidPhase`] unless the session is
    /// [`Phase::Disconnected`]. Encoding or transport failures while sending
    /// the join request are returned after the transport is closed and the
    /// session is back in [`Phase::Disconnected`].
    pub fn connect(&mut self, transport: T) -> Result<(), SessionError> {
        if self.phase != Phase::Disconnected {
            return Err(SessionError::InvalidPhase {
                operation: Operation::Connect,
                phase: self.phase,
            });
        }
        self.peer_addr = transport.peer_addr();
        self.transport = Some(transport);
        self.phase = Phase::Connected;
        tracing::info!(peer = ?self.peer_addr, "connection made");

        if let Some(join) = self.credentials.join_packet() {
            tracing::info!("automatically authenticating");
            if let Err(err) = self.begin_authentication(join) {
                tracing::warn!(error = %err, "join request failed");
                self.detach();
                return Err(err);
            }
        }
        metrics::inc_sessions();
        Ok(())
    }

    fn detach(&mut self) {
        self.close_transport();
        self.transport = None;
        self.peer_addr = None;
        self.phase = Phase::Disconnected;
    }

    /// Send a join request with `credentials`.
    ///
    /// The credentials replace the ones configured on the builder.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidPhase`] unless the session is
    ///   [`Phase::Connected`].
    /// - [`SessionError::MissingPassword`] if `credentials` has no password.
    /// - Encoding or transport failures while sending the request.
    pub fn authenticate(&mut self, credentials: Credentials) -> Result<(), SessionError> {
        if self.phase != Phase::Connected {
            return Err(SessionError::InvalidPhase {
                operation: Operation::Authenticate,
                phase: self.phase,
            });
        }
        let join = credentials
            .join_packet()
            .ok_or(SessionError::MissingPassword)?;
        self.credentials = credentials;
        self.begin_authentication(join)
    }

    fn begin_authentication(&mut self, join: AdminJoin) -> Result<(), SessionError> {
        tracing::debug!(name = %join.name, version = %join.version, "sending join request");
        self.transmit(&Packet::AdminJoin(join))?;
        self.phase = Phase::Authenticating;
        Ok(())
    }

    /// Encode `packet` and hand it to the transport.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidPhase`] unless the session is connected,
    ///   authenticating or authenticated.
    /// - [`SessionError::Codec`] if the packet cannot be encoded. Nothing is
    ///   sent and the session stays open.
    /// - [`SessionError::Transport`] if the transport refuses the bytes.
    pub fn send(&mut self, packet: &Packet) -> Result<(), SessionError> {
        if !self.phase.accepts_frames() {
            return Err(SessionError::InvalidPhase {
                operation: Operation::Send,
                phase: self.phase,
            });
        }
        self.transmit(packet)
    }

    fn transmit(&mut self, packet: &Packet) -> Result<(), SessionError> {
        let bytes = self.codec.encode(packet)?;
        let Some(transport) = self.transport.as_mut() else {
            return Err(SessionError::InvalidPhase {
                operation: Operation::Send,
                phase: self.phase,
            });
        };
        transport.send(bytes)?;
        tracing::trace!(packet = packet.name(), "packet sent");
        metrics::inc_packets(Direction::Outbound);
        Ok(())
    }

    /// Close the session.
    ///
    /// Sends a quit packet on a best-effort basis, drops buffered bytes and
    /// asks the transport to close. The session is [`Phase::Closed`] on
    /// return if the transport closed synchronously, otherwise
    /// [`Phase::Closing`] until [`Session::on_transport_closed`] is called.
    /// Before `connect` the session closes immediately. Calling this while
    /// closing or closed does nothing.
    pub fn disconnect(&mut self) {
        match self.phase {
            Phase::Closing | Phase::Closed => return,
            Phase::Disconnected => {
                self.finish(CloseReason::Requested);
                return;
            }
            Phase::Connected | Phase::Authenticating | Phase::Authenticated => {}
        }
        if let Err(err) = self.transmit(&Packet::AdminQuit(AdminQuit {})) {
            tracing::warn!(error = %err, "failed to send quit");
        }
        self.phase = Phase::Closing;
        self.accumulator.clear();
        if self.close_transport() == CloseProgress::Closed {
            self.finish(CloseReason::Requested);
        }
    }

    /// Record that the transport has closed, with the error that closed it
    /// if there was one.
    ///
    /// A closure the session asked for completes as
    /// [`CloseReason::Requested`]; any other is [`CloseReason::Lost`]. Has
    /// no effect once the session is closed.
    pub fn on_transport_closed(&mut self, error: Option<io::Error>) {
        match self.phase {
            Phase::Closed => tracing::trace!("transport closed after session end"),
            Phase::Closing => {
                if let Some(err) = error {
                    tracing::debug!(error = %err, "transport error while closing");
                }
                self.finish(CloseReason::Requested);
            }
            Phase::Disconnected
            | Phase::Connected
            | Phase::Authenticating
            | Phase::Authenticated => self.finish(CloseReason::Lost(error)),
        }
    }

    fn abort(&mut self, err: CodecError) {
        self.close_transport();
        self.finish(CloseReason::Codec(err));
    }

    fn close_transport(&mut self) -> CloseProgress {
        let Some(transport) = self.transport.as_mut() else {
            return CloseProgress::Closed;
        };
        transport.close().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to close transport");
            CloseProgress::Closed
        })
    }

    fn finish(&mut self, reason: CloseReason) {
        if self.phase != Phase::Disconnected {
            metrics::dec_sessions();
        }
        self.phase = Phase::Closed;
        self.transport = None;
        self.accumulator.clear();
        if reason.is_abnormal() {
            tracing::error!(peer = ?self.peer_addr, %reason, "connection lost");
            metrics::inc_errors(reason.metric_label());
        } else {
            tracing::info!(peer = ?self.peer_addr, "connection closed");
        }
        if let Some(hook) = self.on_close.as_mut() {
            hook(&reason);
        }
        self.close_reason = Some(reason);
    }
}

impl<T> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase)
            .field("peer_addr", &self.peer_addr)
            .field("buffered", &self.accumulator.len())
            .field("handlers", &self.handlers)
            .field("close_reason", &self.close_reason)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
