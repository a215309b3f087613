//! Inbound byte accumulation and the frame pump.

use bytes::{Buf, BytesMut};

use super::{Operation, Phase, Session, SessionError};
use crate::{
    codec::{CodecError, Extracted, PacketCodec},
    metrics::{self, Direction},
    packet::Packet,
    routing::HandlerContext,
    transport::Transport,
};

/// Bytes received but not yet consumed as complete frames.
#[derive(Debug, Default)]
pub struct Accumulator {
    buf: BytesMut,
}

impl Accumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append received bytes.
    pub fn extend(&mut self, bytes: &[u8]) { self.buf.extend_from_slice(bytes); }

    /// Remove and decode the next complete frame.
    ///
    /// Returns `Ok(None)` and leaves the buffer untouched when no complete
    /// frame is available.
    ///
    /// # Errors
    ///
    /// Returns the codec error for a malformed frame. The buffer is left as
    /// it was.
    pub fn next_packet(&mut self, codec: &PacketCodec) -> Result<Option<Packet>, CodecError> {
        let Some(Extracted { consumed, packet }) = codec.extract(&self.buf)? else {
            return Ok(None);
        };
        self.buf.advance(consumed);
        Ok(Some(packet))
    }

    /// Number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize { self.buf.len() }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    /// Drop everything buffered.
    pub fn clear(&mut self) { self.buf.clear(); }
}

impl<T: Transport> Session<T> {
    /// Feed bytes read from the transport and route every complete frame.
    ///
    /// Frames are routed in arrival order. A frame split across calls is
    /// routed once its last byte arrives. Passing an empty slice resumes
    /// routing of frames left buffered by an earlier handler error.
    ///
    /// Returns the number of frames routed by this call. Bytes arriving
    /// while the session is closing are discarded and `Ok(0)` is returned.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidPhase`] before `connect` or after closure.
    /// - [`SessionError::Codec`] for a malformed frame. The session is
    ///   closed before this returns.
    /// - [`SessionError::Handler`] if a handler fails. The session stays
    ///   open and later frames stay buffered.
    /// - [`SessionError::Transport`] if a handler's reply could not be sent.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<usize, SessionError> {
        match self.phase {
            Phase::Connected | Phase::Authenticating | Phase::Authenticated => {}
            Phase::Closing => {
                tracing::trace!(len = bytes.len(), "discarding bytes received while closing");
                return Ok(0);
            }
            Phase::Disconnected | Phase::Closed => {
                return Err(SessionError::InvalidPhase {
                    operation: Operation::Receive,
                    phase: self.phase,
                });
            }
        }
        self.accumulator.extend(bytes);
        self.pump()
    }

    fn pump(&mut self) -> Result<usize, SessionError> {
        let mut routed = 0;
        while self.phase.accepts_frames() {
            let packet = match self.accumulator.next_packet(&self.codec) {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(err) => {
                    self.abort(err.clone());
                    return Err(SessionError::Codec(err));
                }
            };
            routed += 1;
            self.route(&packet)?;
        }
        Ok(routed)
    }

    fn route(&mut self, packet: &Packet) -> Result<(), SessionError> {
        metrics::inc_packets(Direction::Inbound);
        if self.phase == Phase::Authenticating && matches!(packet, Packet::ServerWelcome(_)) {
            self.phase = Phase::Authenticated;
            tracing::info!(peer = ?self.peer_addr, "authenticated");
        }

        let mut ctx = HandlerContext::new(self.phase, self.peer_addr);
        let outcome = self.handlers.dispatch(&mut ctx, packet);
        let (outbound, disconnect) = ctx.into_parts();

        let mut sent = Ok(());
        for reply in &outbound {
            if let Err(err) = self.send(reply) {
                sent = Err(err);
                break;
            }
        }
        if disconnect {
            self.disconnect();
        }

        if let Err(source) = outcome {
            tracing::warn!(packet = packet.name(), error = %source, "handler failed");
            metrics::inc_errors("handler");
            return Err(SessionError::Handler {
                packet: packet.name(),
                source,
            });
        }
        sent
    }
}
