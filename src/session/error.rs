//! Error and closure types for sessions.

use std::{fmt, io};

use crate::{codec::CodecError, routing::HandlerError, session::Phase};

/// Session entry points, named in usage errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// [`Session::connect`](super::Session::connect).
    Connect,
    /// [`Session::authenticate`](super::Session::authenticate).
    Authenticate,
    /// [`Session::receive`](super::Session::receive).
    Receive,
    /// [`Session::send`](super::Session::send).
    Send,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Authenticate => "authenticate",
            Self::Receive => "receive",
            Self::Send => "send",
        })
    }
}

/// Errors returned by [`Session`](super::Session) operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The operation is not legal in the current phase.
    #[error("cannot {operation} while {phase}")]
    InvalidPhase {
        /// Operation attempted.
        operation: Operation,
        /// Phase the session was in.
        phase: Phase,
    },
    /// Authentication was requested without a password.
    #[error("no password configured")]
    MissingPassword,
    /// Encoding an outbound packet or decoding the inbound stream failed.
    ///
    /// Inbound codec errors have already closed the session.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    /// A packet handler failed. The session stays open.
    #[error("handler for {packet} failed: {source}")]
    Handler {
        /// Name of the packet being handled.
        packet: &'static str,
        /// Error returned by the handler.
        #[source]
        source: HandlerError,
    },
    /// The transport refused outbound bytes.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

/// Why a session reached [`Phase::Closed`].
#[derive(Debug)]
pub enum CloseReason {
    /// The local side disconnected.
    Requested,
    /// The transport closed or failed without a local disconnect.
    Lost(Option<io::Error>),
    /// The inbound byte stream could not be framed or decoded.
    Codec(CodecError),
}

impl CloseReason {
    /// Returns true unless the close was requested locally.
    #[must_use]
    pub fn is_abnormal(&self) -> bool { !matches!(self, Self::Requested) }

    pub(crate) fn metric_label(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Lost(_) => "connection_lost",
            Self::Codec(_) => "codec",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("closed by client"),
            Self::Lost(None) => f.write_str("connection closed by peer"),
            Self::Lost(Some(err)) => write!(f, "connection lost: {err}"),
            Self::Codec(err) => write!(f, "unreadable stream: {err}"),
        }
    }
}
