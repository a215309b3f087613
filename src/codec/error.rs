//! Error types for the codec layer.
//!
//! This module separates failures found while locating a packet boundary
//! from failures found while decoding a packet body whose boundary was
//! already known, plus the (local) failures of encoding an outbound packet.
//!
//! # Error Categories
//!
//! - [`FramingError`]: the size prefix is impossible (too small to hold the header, or larger than
//!   the configured maximum).
//! - [`ProtocolError`]: a packet body of a known kind is malformed (truncated field, string
//!   without terminator, invalid UTF-8).
//! - [`EncodeError`]: an outbound packet cannot be represented on the wire.
//! - [`CodecError`]: top-level enum wrapping the three categories.
//!
//! Inbound framing and protocol errors are never recovered in place: a
//! session that sees one closes, because the byte stream can no longer be
//! trusted to be aligned on packet boundaries.

use std::io;

use thiserror::Error;

use crate::packet::PacketKind;

/// Framing-level errors detected from the packet size prefix alone.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// Size prefix indicates a packet exceeding the configured maximum.
    #[error("packet exceeds max size: {size} > {max}")]
    OversizedFrame {
        /// Size announced by the prefix.
        size: usize,
        /// Maximum allowed packet size.
        max: usize,
    },

    /// Size prefix is smaller than the packet header itself.
    #[error("packet size {size} is smaller than the {header} byte header")]
    UndersizedFrame {
        /// Size announced by the prefix.
        size: usize,
        /// Size of the fixed packet header.
        header: usize,
    },
}

/// Errors decoding the body of a packet whose boundary is known.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The body ended before a fixed-width field was complete.
    #[error("{kind}: truncated field `{field}`: need {need} bytes, have {have}")]
    Truncated {
        /// Packet being decoded.
        kind: PacketKind,
        /// Field being read.
        field: &'static str,
        /// Bytes required by the field.
        need: usize,
        /// Bytes left in the body.
        have: usize,
    },

    /// A string field has no NUL terminator before the end of the body.
    #[error("{kind}: string field `{field}` is not terminated")]
    UnterminatedString {
        /// Packet being decoded.
        kind: PacketKind,
        /// Field being read.
        field: &'static str,
    },

    /// A string field is not valid UTF-8.
    #[error("{kind}: string field `{field}` is not valid UTF-8")]
    InvalidUtf8 {
        /// Packet being decoded.
        kind: PacketKind,
        /// Field being read.
        field: &'static str,
    },
}

/// Errors encoding an outbound packet.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// The encoded packet would exceed the configured maximum size.
    #[error("encoded packet exceeds max size: {size} > {max}")]
    OversizedPacket {
        /// Size the packet would have on the wire.
        size: usize,
        /// Maximum allowed packet size.
        max: usize,
    },

    /// A string field contains an interior NUL, which would truncate it.
    #[error("string field `{field}` contains a NUL byte")]
    InteriorNul {
        /// Field being written.
        field: &'static str,
    },
}

/// Top-level codec error taxonomy.
///
/// # Examples
///
/// ```
/// use adminport::codec::{CodecError, FramingError};
///
/// let err = CodecError::Framing(FramingError::OversizedFrame {
///     size: 40_000,
///     max: 32_767,
/// });
/// assert!(err.is_inbound());
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Packet boundary could not be established.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Packet body could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Outbound packet could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

impl CodecError {
    /// Returns true if the error was raised while reading from the peer.
    ///
    /// Inbound errors leave the byte stream misaligned and are fatal for the
    /// session; encode errors only reject the offending outbound packet.
    #[must_use]
    pub fn is_inbound(&self) -> bool { !matches!(self, Self::Encode(_)) }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Framing(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            CodecError::Protocol(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            CodecError::Encode(e) => io::Error::new(io::ErrorKind::InvalidInput, e),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
