//! Builder for [`Session`].

use super::{CloseReason, Credentials, Phase, Session, pump::Accumulator};
use crate::{codec::PacketCodec, routing::HandlerRegistry, transport::Transport};

/// Callback run once when a session reaches [`Phase::Closed`].
pub type CloseHook = Box<dyn FnMut(&CloseReason) + Send + 'static>;

/// Configures a [`Session`] before it is connected.
///
/// # Examples
///
/// ```
/// use adminport::{
///     packet::ServerDate,
///     routing::HandlerRegistry,
///     session::{Credentials, Phase, Session},
/// };
/// use adminport_testing::MockTransport;
///
/// let handlers = HandlerRegistry::new()
///     .on::<ServerDate, _>(|_ctx, date| {
///         println!("day {}", date.date);
///         Ok(())
///     })
///     .expect("register date handler");
/// let session: Session<MockTransport> = Session::builder()
///     .credentials(Credentials::new().password("secret"))
///     .handlers(handlers)
///     .on_close(|reason| println!("closed: {reason}"))
///     .build();
/// assert_eq!(session.phase(), Phase::Disconnected);
/// ```
#[derive(Default)]
pub struct SessionBuilder {
    credentials: Credentials,
    codec: PacketCodec,
    handlers: HandlerRegistry,
    on_close: Option<CloseHook>,
}

impl SessionBuilder {
    /// Start from defaults: no password, no handlers and the default
    /// maximum packet size.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Credentials used for the join request.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Largest packet accepted or sent, header included.
    ///
    /// Values outside `3..=65535` are clamped.
    #[must_use]
    pub fn max_packet_size(mut self, size: usize) -> Self {
        self.codec = PacketCodec::new(size);
        self
    }

    /// Handlers that receive routed packets.
    #[must_use]
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Register a callback for session closure.
    #[must_use]
    pub fn on_close<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&CloseReason) + Send + 'static,
    {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Build a disconnected session.
    #[must_use]
    pub fn build<T: Transport>(self) -> Session<T> {
        Session {
            credentials: self.credentials,
            codec: self.codec,
            phase: Phase::Disconnected,
            accumulator: Accumulator::new(),
            transport: None,
            peer_addr: None,
            handlers: self.handlers,
            on_close: self.on_close,
            close_reason: None,
        }
    }
}
