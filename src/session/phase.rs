//! Connection phases of a session.

use std::fmt;

/// Lifecycle phase of a [`Session`](super::Session).
///
/// Phases only move forward; a `Closed` session is never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No transport yet. Initial phase.
    Disconnected,
    /// Transport attached, authentication left to the caller.
    Connected,
    /// Join request sent, waiting for the welcome packet.
    Authenticating,
    /// Welcome packet received.
    Authenticated,
    /// Quit sent, waiting for the transport to close.
    Closing,
    /// Terminal.
    Closed,
}

impl Phase {
    /// Returns true if incoming frames are routed in this phase.
    #[must_use]
    pub const fn accepts_frames(self) -> bool {
        matches!(
            self,
            Self::Connected | Self::Authenticating | Self::Authenticated
        )
    }

    /// Returns true for the terminal phase.
    #[must_use]
    pub const fn is_closed(self) -> bool { matches!(self, Self::Closed) }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Phase;

    #[rstest]
    #[case(Phase::Disconnected, false)]
    #[case(Phase::Connected, true)]
    #[case(Phase::Authenticating, true)]
    #[case(Phase::Authenticated, true)]
    #[case(Phase::Closing, false)]
    #[case(Phase::Closed, false)]
    fn only_open_phases_accept_frames(#[case] phase: Phase, #[case] expected: bool) {
        assert_eq!(phase.accepts_frames(), expected);
    }
}
