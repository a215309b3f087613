//! Field-level reading and writing of packet bodies.
//!
//! Every field type that can appear in a packet body implements
//! [`WireField`]. Lists use OpenTTD's continuation encoding: each entry is
//! preceded by a `true` byte and the list ends with a `false` byte.

use bytes::{BufMut, Bytes, BytesMut};

use super::PacketKind;
use crate::{
    byte_order::{
        read_wire_u16,
        read_wire_u32,
        read_wire_u64,
        write_wire_u16,
        write_wire_u32,
        write_wire_u64,
    },
    codec::{EncodeError, ProtocolError},
};

/// Cursor over the body of a single packet.
#[derive(Debug)]
pub struct PacketReader<'a> {
    kind: PacketKind,
    body: &'a [u8],
}

impl<'a> PacketReader<'a> {
    /// Create a reader over `body`, attributing errors to `kind`.
    #[must_use]
    pub fn new(kind: PacketKind, body: &'a [u8]) -> Self { Self { kind, body } }

    /// Bytes left unread in the body.
    #[must_use]
    pub fn remaining(&self) -> usize { self.body.len() }

    fn take<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], ProtocolError> {
        let Some((head, rest)) = self.body.split_first_chunk::<N>() else {
            return Err(ProtocolError::Truncated {
                kind: self.kind,
                field,
                need: N,
                have: self.body.len(),
            });
        };
        self.body = rest;
        Ok(*head)
    }

    /// Read one byte.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if the body is exhausted.
    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, ProtocolError> {
        let [byte] = self.take::<1>(field)?;
        Ok(byte)
    }

    /// Read a little-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if fewer than two bytes remain.
    pub fn read_u16(&mut self, field: &'static str) -> Result<u16, ProtocolError> {
        self.take(field).map(read_wire_u16)
    }

    /// Read a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if fewer than four bytes remain.
    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, ProtocolError> {
        self.take(field).map(read_wire_u32)
    }

    /// Read a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if fewer than eight bytes remain.
    pub fn read_u64(&mut self, field: &'static str) -> Result<u64, ProtocolError> {
        self.take(field).map(read_wire_u64)
    }

    /// Read a NUL-terminated UTF-8 string, consuming the terminator.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnterminatedString`] if no NUL byte remains
    /// and [`ProtocolError::InvalidUtf8`] if the bytes are not UTF-8.
    pub fn read_string(&mut self, field: &'static str) -> Result<String, ProtocolError> {
        let Some(end) = self.body.iter().position(|&b| b == 0) else {
            return Err(ProtocolError::UnterminatedString {
                kind: self.kind,
                field,
            });
        };
        let (text, rest) = self.body.split_at(end);
        let text = std::str::from_utf8(text).map_err(|_| ProtocolError::InvalidUtf8 {
            kind: self.kind,
            field,
        })?;
        self.body = &rest[1..];
        Ok(text.to_owned())
    }
}

/// Growable buffer for an outbound packet body.
#[derive(Debug, Default)]
pub struct PacketWriter {
    buf: BytesMut,
}

impl PacketWriter {
    /// Create a writer whose buffer already holds `prefix`.
    pub(crate) fn with_prefix(prefix: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(64);
        buf.extend_from_slice(prefix);
        Self { buf }
    }

    /// Number of bytes written so far, prefix included.
    #[must_use]
    pub fn len(&self) -> usize { self.buf.len() }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    /// Append one byte.
    pub fn write_u8(&mut self, value: u8) { self.buf.put_u8(value); }

    /// Append a little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) { self.buf.put_slice(&write_wire_u16(value)); }

    /// Append a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) { self.buf.put_slice(&write_wire_u32(value)); }

    /// Append a little-endian `u64`.
    pub fn write_u64(&mut self, value: u64) { self.buf.put_slice(&write_wire_u64(value)); }

    /// Append `value` followed by a NUL terminator.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::InteriorNul`] if `value` contains a NUL byte.
    pub fn write_string(&mut self, field: &'static str, value: &str) -> Result<(), EncodeError> {
        if value.as_bytes().contains(&0) {
            return Err(EncodeError::InteriorNul { field });
        }
        self.buf.put_slice(value.as_bytes());
        self.buf.put_u8(0);
        Ok(())
    }

    pub(crate) fn buf_mut(&mut self) -> &mut BytesMut { &mut self.buf }

    pub(crate) fn freeze(self) -> Bytes { self.buf.freeze() }
}

/// A value that can be read from and written to a packet body.
pub trait WireField: Sized {
    /// Read the value named `field` from `reader`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if the body is malformed.
    fn read(reader: &mut PacketReader<'_>, field: &'static str) -> Result<Self, ProtocolError>;

    /// Write the value named `field` to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the value cannot be represented.
    fn write(&self, writer: &mut PacketWriter, field: &'static str) -> Result<(), EncodeError>;
}

macro_rules! int_field {
    ($ty:ty, $read:ident, $write:ident) => {
        impl WireField for $ty {
            fn read(reader: &mut PacketReader<'_>, field: &'static str) -> Result<Self, ProtocolError> {
                reader.$read(field)
            }

            fn write(&self, writer: &mut PacketWriter, _field: &'static str) -> Result<(), EncodeError> {
                writer.$write(*self);
                Ok(())
            }
        }
    };
}

int_field!(u8, read_u8, write_u8);
int_field!(u16, read_u16, write_u16);
int_field!(u32, read_u32, write_u32);
int_field!(u64, read_u64, write_u64);

impl WireField for bool {
    fn read(reader: &mut PacketReader<'_>, field: &'static str) -> Result<Self, ProtocolError> {
        reader.read_u8(field).map(|b| b != 0)
    }

    fn write(&self, writer: &mut PacketWriter, _field: &'static str) -> Result<(), EncodeError> {
        writer.write_u8(u8::from(*self));
        Ok(())
    }
}

impl WireField for String {
    fn read(reader: &mut PacketReader<'_>, field: &'static str) -> Result<Self, ProtocolError> {
        reader.read_string(field)
    }

    fn write(&self, writer: &mut PacketWriter, field: &'static str) -> Result<(), EncodeError> {
        writer.write_string(field, self)
    }
}

impl<T: WireField> WireField for Vec<T> {
    fn read(reader: &mut PacketReader<'_>, field: &'static str) -> Result<Self, ProtocolError> {
        let mut entries = Vec::new();
        while bool::read(reader, field)? {
            entries.push(T::read(reader, field)?);
        }
        Ok(entries)
    }

    fn write(&self, writer: &mut PacketWriter, field: &'static str) -> Result<(), EncodeError> {
        for entry in self {
            true.write(writer, field)?;
            entry.write(writer, field)?;
        }
        false.write(writer, field)
    }
}

/// Define a plain struct whose fields are read and written in declaration
/// order.
macro_rules! wire_struct {
    (
        $(#[$meta:meta])*
        $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::packet::WireField for $name {
            #[allow(unused_variables, reason = "field-less packets never touch the reader")]
            fn read(
                reader: &mut $crate::packet::PacketReader<'_>,
                _field: &'static str,
            ) -> Result<Self, $crate::codec::ProtocolError> {
                Ok(Self {
                    $($field: <$ty as $crate::packet::WireField>::read(reader, stringify!($field))?,)*
                })
            }

            #[allow(unused_variables, reason = "field-less packets never touch the writer")]
            fn write(
                &self,
                writer: &mut $crate::packet::PacketWriter,
                _field: &'static str,
            ) -> Result<(), $crate::codec::EncodeError> {
                $($crate::packet::WireField::write(&self.$field, writer, stringify!($field))?;)*
                Ok(())
            }
        }
    };
}

pub(crate) use wire_struct;
