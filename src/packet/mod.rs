//! Typed admin port packets.
//!
//! Every packet the crate understands is a plain struct with public, named
//! fields. [`Packet`] is the closed set of those structs plus
//! [`Packet::Unknown`] for type ids this crate does not model, and
//! [`PacketKind`] is the matching field-less tag used as the dispatch key.

use std::fmt;

use bytes::Bytes;

use crate::codec::{EncodeError, ProtocolError};

mod admin;
mod server;
mod wire;

pub use admin::{
    AdminChat,
    AdminGamescript,
    AdminJoin,
    AdminPing,
    AdminPoll,
    AdminQuit,
    AdminRcon,
    AdminUpdateFrequency,
    UpdateType,
    action,
    destination,
    frequency,
};
pub use server::{
    CommandName,
    ServerBanned,
    ServerChat,
    ServerClientError,
    ServerClientInfo,
    ServerClientJoin,
    ServerClientQuit,
    ServerClientUpdate,
    ServerCmdNames,
    ServerCompanyInfo,
    ServerCompanyNew,
    ServerCompanyRemove,
    ServerCompanyUpdate,
    ServerConsole,
    ServerDate,
    ServerError,
    ServerFull,
    ServerGamescript,
    ServerNewGame,
    ServerPong,
    ServerProtocol,
    ServerRcon,
    ServerRconEnd,
    ServerShutdown,
    ServerWelcome,
    UpdateSetting,
};
pub use wire::{PacketReader, PacketWriter, WireField};

/// A packet struct with a fixed kind.
///
/// Implemented for every struct listed in [`PacketKind`]; this is what lets
/// [`HandlerRegistry::on`](crate::routing::HandlerRegistry::on) accept only
/// packet types that actually exist.
pub trait PacketBody: WireField + Into<Packet> + Send + 'static {
    /// Tag of this packet type.
    const KIND: PacketKind;

    /// Borrow the body if `packet` is of this type.
    fn from_packet(packet: &Packet) -> Option<&Self>;
}

macro_rules! packets {
    ($($name:ident = $id:literal),* $(,)?) => {
        /// Tag identifying a packet type. The discriminant is the wire type id.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum PacketKind {
            $(
                #[doc = concat!("Tag for [`", stringify!($name), "`].")]
                $name = $id,
            )*
        }

        impl PacketKind {
            /// Every kind, in type id order.
            pub const ALL: &'static [PacketKind] = &[$(PacketKind::$name),*];

            /// Look up the kind for a wire type id.
            #[must_use]
            pub const fn from_type_id(type_id: u8) -> Option<Self> {
                match type_id {
                    $($id => Some(Self::$name),)*
                    _ => None,
                }
            }

            /// Packet name, for example `"ServerChat"`.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }
        }

        /// A decoded admin port packet.
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub enum Packet {
            $(
                #[doc = concat!("See [`", stringify!($name), "`].")]
                $name($name),
            )*
            /// A packet type this crate does not model.
            Unknown {
                /// Wire type id.
                type_id: u8,
                /// Undecoded body.
                payload: Bytes,
            },
        }

        impl Packet {
            /// Kind of this packet, or `None` for [`Packet::Unknown`].
            #[must_use]
            pub fn kind(&self) -> Option<PacketKind> {
                match self {
                    $(Self::$name(_) => Some(PacketKind::$name),)*
                    Self::Unknown { .. } => None,
                }
            }

            pub(crate) fn decode(type_id: u8, body: &[u8]) -> Result<Self, ProtocolError> {
                let Some(kind) = PacketKind::from_type_id(type_id) else {
                    return Ok(Self::Unknown {
                        type_id,
                        payload: Bytes::copy_from_slice(body),
                    });
                };
                let mut reader = PacketReader::new(kind, body);
                match kind {
                    $(PacketKind::$name => {
                        <$name as WireField>::read(&mut reader, stringify!($name)).map(Self::$name)
                    })*
                }
            }

            pub(crate) fn encode_body(&self, writer: &mut PacketWriter) -> Result<(), EncodeError> {
                match self {
                    $(Self::$name(body) => body.write(writer, stringify!($name)),)*
                    Self::Unknown { payload, .. } => {
                        writer.buf_mut().extend_from_slice(payload);
                        Ok(())
                    }
                }
            }
        }

        $(
            impl PacketBody for $name {
                const KIND: PacketKind = PacketKind::$name;

                fn from_packet(packet: &Packet) -> Option<&Self> {
                    match packet {
                        Packet::$name(body) => Some(body),
                        _ => None,
                    }
                }
            }

            impl From<$name> for Packet {
                fn from(body: $name) -> Self { Self::$name(body) }
            }
        )*
    };
}

packets! {
    AdminJoin = 0,
    AdminQuit = 1,
    AdminUpdateFrequency = 2,
    AdminPoll = 3,
    AdminChat = 4,
    AdminRcon = 5,
    AdminGamescript = 6,
    AdminPing = 7,
    ServerFull = 100,
    ServerBanned = 101,
    ServerError = 102,
    ServerProtocol = 103,
    ServerWelcome = 104,
    ServerNewGame = 105,
    ServerShutdown = 106,
    ServerDate = 107,
    ServerClientJoin = 108,
    ServerClientInfo = 109,
    ServerClientUpdate = 110,
    ServerClientQuit = 111,
    ServerClientError = 112,
    ServerCompanyNew = 113,
    ServerCompanyInfo = 114,
    ServerCompanyUpdate = 115,
    ServerCompanyRemove = 116,
    ServerChat = 119,
    ServerRcon = 120,
    ServerConsole = 121,
    ServerCmdNames = 122,
    ServerGamescript = 124,
    ServerRconEnd = 125,
    ServerPong = 126,
}

impl PacketKind {
    /// Wire type id of this kind.
    #[must_use]
    pub const fn type_id(self) -> u8 { self as u8 }

    /// Conventional handler name, for example `"on_server_chat"`.
    ///
    /// Dispatch does not use this name; it only appears in diagnostics.
    #[must_use]
    pub fn handler_name(self) -> String {
        let name = self.name();
        let mut out = String::with_capacity(name.len() + 8);
        out.push_str("on");
        for c in name.chars() {
            if c.is_ascii_uppercase() {
                out.push('_');
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl Packet {
    /// Wire type id of this packet.
    #[must_use]
    pub fn type_id(&self) -> u8 {
        match self {
            Self::Unknown { type_id, .. } => *type_id,
            known => known.kind().map_or(0, PacketKind::type_id),
        }
    }

    /// Packet name for diagnostics; `"Unknown"` for unmodelled type ids.
    #[must_use]
    pub fn name(&self) -> &'static str { self.kind().map_or("Unknown", PacketKind::name) }
}
