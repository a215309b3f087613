//! Packet dispatch by kind.
//!
//! Handlers are registered per packet type. The registry is keyed by
//! [`PacketKind`] and each entry downcasts the decoded [`Packet`] back to the
//! struct it was registered for, so a handler always receives its packet's
//! fields by name and can never be registered for a kind that does not
//! exist.

use std::{collections::HashMap, fmt, net::SocketAddr};

use crate::{
    packet::{Packet, PacketBody, PacketKind},
    session::Phase,
};

/// Error returned by a packet handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for packet handlers.
pub type HandlerResult = Result<(), HandlerError>;

type BoxedHandler = Box<dyn FnMut(&mut HandlerContext, &Packet) -> HandlerResult + Send>;

/// Errors building a [`HandlerRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A handler for this kind was already registered.
    #[error("a handler for {0} is already registered")]
    DuplicateHandler(PacketKind),
}

/// Outcome of routing one packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler ran to completion.
    Handled,
    /// No handler is interested in the packet's kind.
    Ignored,
}

/// View of the session given to a handler.
///
/// Outbound packets and disconnect requests are queued and applied by the
/// session once the handler returns, in the order they were queued.
#[derive(Debug)]
pub struct HandlerContext {
    phase: Phase,
    peer_addr: Option<SocketAddr>,
    outbound: Vec<Packet>,
    disconnect: bool,
}

impl HandlerContext {
    pub(crate) fn new(phase: Phase, peer_addr: Option<SocketAddr>) -> Self {
        Self {
            phase,
            peer_addr,
            outbound: Vec::new(),
            disconnect: false,
        }
    }

    /// Phase of the session when the packet was routed.
    #[must_use]
    pub fn phase(&self) -> Phase { self.phase }

    /// Address of the server, if the transport reported one.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> { self.peer_addr }

    /// Queue `packet` to be sent after the handler returns.
    pub fn send(&mut self, packet: impl Into<Packet>) { self.outbound.push(packet.into()); }

    /// Ask the session to disconnect after the handler returns.
    ///
    /// Packets still buffered behind the current one are discarded.
    pub fn disconnect(&mut self) { self.disconnect = true; }

    pub(crate) fn into_parts(self) -> (Vec<Packet>, bool) { (self.outbound, self.disconnect) }
}

/// Table of packet handlers keyed by kind.
///
/// # Examples
///
/// ```
/// use adminport::{
///     packet::{AdminPing, ServerChat, ServerPong},
///     routing::HandlerRegistry,
/// };
///
/// let registry = HandlerRegistry::new()
///     .on::<ServerChat, _>(|_ctx, chat| {
///         println!("<{}> {}", chat.client_id, chat.message);
///         Ok(())
///     })
///     .expect("register chat")
///     .on::<ServerPong, _>(|ctx, pong| {
///         ctx.send(AdminPing { payload: pong.payload + 1 });
///         Ok(())
///     })
///     .expect("register pong");
/// assert_eq!(registry.len(), 2);
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<PacketKind, BoxedHandler>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register `handler` for packets of type `P`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateHandler`] if `P` already has a
    /// handler.
    pub fn on<P, F>(mut self, mut handler: F) -> Result<Self, RegistryError>
    where
        P: PacketBody,
        F: FnMut(&mut HandlerContext, &P) -> HandlerResult + Send + 'static,
    {
        if self.handlers.contains_key(&P::KIND) {
            return Err(RegistryError::DuplicateHandler(P::KIND));
        }
        let boxed: BoxedHandler = Box::new(move |ctx: &mut HandlerContext, packet: &Packet| {
            match P::from_packet(packet) {
                Some(body) => handler(ctx, body),
                None => Ok(()),
            }
        });
        self.handlers.insert(P::KIND, boxed);
        Ok(self)
    }

    /// Returns true if a handler is registered for `kind`.
    #[must_use]
    pub fn contains(&self, kind: PacketKind) -> bool { self.handlers.contains_key(&kind) }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize { self.handlers.len() }

    /// Returns true if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.handlers.is_empty() }

    /// Route `packet` to its handler, if any.
    ///
    /// # Errors
    ///
    /// Returns the handler's error unchanged.
    pub fn dispatch(
        &mut self,
        ctx: &mut HandlerContext,
        packet: &Packet,
    ) -> Result<Dispatch, HandlerError> {
        tracing::debug!(
            packet = packet.name(),
            type_id = packet.type_id(),
            "packet received"
        );
        let Some(handler) = packet.kind().and_then(|kind| self.handlers.get_mut(&kind)) else {
            tracing::trace!(packet = packet.name(), "no handler registered, ignoring");
            return Ok(Dispatch::Ignored);
        };
        handler(ctx, packet)?;
        Ok(Dispatch::Handled)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
