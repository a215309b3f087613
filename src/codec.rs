//! Framing codec for the admin port wire format.
//!
//! A packet on the wire is a little-endian `u16` size (counting the whole
//! packet, header included), a one-byte type id and the body:
//!
//! ```text
//! +--------+--------+------+----------------+
//! | size (u16, LE)  | type | body ...       |
//! +--------+--------+------+----------------+
//! ```
//!
//! [`PacketCodec::extract`] is the pure frame extractor used by the session's
//! stream pump. The codec also implements `tokio_util`'s [`Decoder`] and
//! [`Encoder`] so it can drive a `Framed` transport directly.

use std::io;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    byte_order::{read_wire_u16, write_wire_u16},
    packet::{Packet, PacketWriter},
};

pub mod error;

pub use error::{CodecError, EncodeError, FramingError, ProtocolError};

/// Size of the size prefix in bytes.
pub const SIZE_PREFIX_LEN: usize = 2;

/// Size of the packet header (size prefix plus type id) in bytes.
pub const HEADER_SIZE: usize = SIZE_PREFIX_LEN + 1;

/// Default maximum packet size, matching OpenTTD's `TCP_MTU`.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 32_767;

/// Largest packet size the `u16` prefix can express.
pub const MAX_PACKET_SIZE: usize = u16::MAX as usize;

pub(crate) fn clamp_packet_size(value: usize) -> usize { value.clamp(HEADER_SIZE, MAX_PACKET_SIZE) }

/// A complete packet found at the front of a buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extracted {
    /// Exact number of bytes the packet occupies, header included.
    pub consumed: usize,
    /// Decoded packet.
    pub packet: Packet,
}

/// Codec for admin port packets.
///
/// # Examples
///
/// ```
/// use adminport::{
///     codec::PacketCodec,
///     packet::{Packet, ServerDate},
/// };
///
/// let codec = PacketCodec::default();
/// let bytes = codec
///     .encode(&Packet::from(ServerDate { date: 1 }))
///     .expect("encode date");
/// let extracted = codec.extract(&bytes).expect("decode").expect("complete");
/// assert_eq!(extracted.consumed, bytes.len());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketCodec {
    max_packet_size: usize,
}

impl PacketCodec {
    /// Construct a codec with a maximum packet size.
    ///
    /// The value is clamped to `HEADER_SIZE..=MAX_PACKET_SIZE`.
    #[must_use]
    pub fn new(max_packet_size: usize) -> Self {
        Self {
            max_packet_size: clamp_packet_size(max_packet_size),
        }
    }

    /// Return the maximum packet size accepted by this codec.
    #[must_use]
    pub const fn max_packet_size(&self) -> usize { self.max_packet_size }

    /// Look for a complete packet at the front of `buffer`.
    ///
    /// Returns `Ok(None)` when more bytes are needed. The buffer is never
    /// modified; calling this twice on the same contents yields the same
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Framing`] if the size prefix is impossible and
    /// [`CodecError::Protocol`] if the body of a known packet is malformed.
    pub fn extract(&self, buffer: &[u8]) -> Result<Option<Extracted>, CodecError> {
        let Some(size) = self.peek_size(buffer)? else {
            return Ok(None);
        };
        let Some(packet) = buffer.get(..size) else {
            return Ok(None);
        };
        let packet = Packet::decode(packet[SIZE_PREFIX_LEN], &packet[HEADER_SIZE..])?;
        Ok(Some(Extracted {
            consumed: size,
            packet,
        }))
    }

    /// Read and validate the size prefix, if it has arrived.
    fn peek_size(&self, buffer: &[u8]) -> Result<Option<usize>, FramingError> {
        let Some(prefix) = buffer.first_chunk::<SIZE_PREFIX_LEN>() else {
            return Ok(None);
        };
        let size = usize::from(read_wire_u16(*prefix));
        if size < HEADER_SIZE {
            return Err(FramingError::UndersizedFrame {
                size,
                header: HEADER_SIZE,
            });
        }
        if size > self.max_packet_size {
            return Err(FramingError::OversizedFrame {
                size,
                max: self.max_packet_size,
            });
        }
        Ok(Some(size))
    }

    /// Encode `packet` into a complete wire packet.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if a string contains a NUL byte or the
    /// packet would exceed the maximum size.
    pub fn encode(&self, packet: &Packet) -> Result<Bytes, CodecError> {
        let mut writer = PacketWriter::with_prefix(&[0, 0, packet.type_id()]);
        packet.encode_body(&mut writer)?;
        let size = writer.len();
        if size > self.max_packet_size {
            return Err(EncodeError::OversizedPacket {
                size,
                max: self.max_packet_size,
            }
            .into());
        }
        let prefix = u16::try_from(size).map_err(|_| EncodeError::OversizedPacket {
            size,
            max: self.max_packet_size,
        })?;
        writer.buf_mut()[..SIZE_PREFIX_LEN].copy_from_slice(&write_wire_u16(prefix));
        Ok(writer.freeze())
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.extract(src)? {
            Some(Extracted { consumed, packet }) => {
                src.advance(consumed);
                Ok(Some(packet))
            }
            None => {
                if let Ok(Some(size)) = self.peek_size(src) {
                    src.reserve(size.saturating_sub(src.len()));
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = PacketCodec::encode(self, &item)?;
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}
