//! Helpers for the admin port's wire byte order.
//!
//! OpenTTD writes every integer little-endian, including the packet size
//! prefix. Keeping the conversions here lets the packet reader and writer stay
//! explicit about byte order without repeating `from_le_bytes` everywhere.

/// Serialise a `u16` in wire byte order (little-endian).
///
/// # Examples
///
/// ```
/// use adminport::byte_order::write_wire_u16;
///
/// assert_eq!(write_wire_u16(0x1234), [0x34, 0x12]);
/// ```
#[must_use]
pub fn write_wire_u16(value: u16) -> [u8; 2] { value.to_le_bytes() }

/// Parse a wire-order `u16` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use adminport::byte_order::read_wire_u16;
///
/// assert_eq!(read_wire_u16([0x34, 0x12]), 0x1234);
/// ```
#[must_use]
pub fn read_wire_u16(bytes: [u8; 2]) -> u16 { u16::from_le_bytes(bytes) }

/// Serialise a `u32` in wire byte order (little-endian).
///
/// # Examples
///
/// ```
/// use adminport::byte_order::write_wire_u32;
///
/// assert_eq!(write_wire_u32(0x1234_5678), [0x78, 0x56, 0x34, 0x12]);
/// ```
#[must_use]
pub fn write_wire_u32(value: u32) -> [u8; 4] { value.to_le_bytes() }

/// Parse a wire-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use adminport::byte_order::read_wire_u32;
///
/// assert_eq!(read_wire_u32([0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_wire_u32(bytes: [u8; 4]) -> u32 { u32::from_le_bytes(bytes) }

/// Serialise a `u64` in wire byte order (little-endian).
#[must_use]
pub fn write_wire_u64(value: u64) -> [u8; 8] { value.to_le_bytes() }

/// Parse a wire-order `u64` from its on-wire representation.
#[must_use]
pub fn read_wire_u64(bytes: [u8; 8]) -> u64 { u64::from_le_bytes(bytes) }
