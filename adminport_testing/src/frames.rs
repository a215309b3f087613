//! Builders for admin port wire bytes.

use adminport::{codec::PacketCodec, packet::Packet};
use bytes::{Bytes, BytesMut};

/// Encode `packet` with the default codec.
///
/// # Panics
///
/// Panics if the packet cannot be encoded.
#[must_use]
pub fn frame(packet: impl Into<Packet>) -> Bytes {
    PacketCodec::default()
        .encode(&packet.into())
        .expect("test packet encodes")
}

/// Encode `packets` back to back into one buffer.
#[must_use]
pub fn concat_frames<I, P>(packets: I) -> Bytes
where
    I: IntoIterator<Item = P>,
    P: Into<Packet>,
{
    let mut buf = BytesMut::new();
    for packet in packets {
        buf.extend_from_slice(&frame(packet));
    }
    buf.freeze()
}

/// Build a packet from a type id and body without going through the
/// packet model, with a correct size prefix.
///
/// # Panics
///
/// Panics if the packet would exceed `u16::MAX` bytes.
#[must_use]
pub fn raw_frame(type_id: u8, body: &[u8]) -> Bytes {
    let size = u16::try_from(body.len() + 3).expect("raw frame fits a u16 size");
    let mut buf = BytesMut::with_capacity(usize::from(size));
    buf.extend_from_slice(&size.to_le_bytes());
    buf.extend_from_slice(&[type_id]);
    buf.extend_from_slice(body);
    buf.freeze()
}
