#![doc(html_root_url = "https://docs.rs/adminport/latest")]
//! Client-side session manager for the OpenTTD admin port.
//!
//! The admin port is a TCP protocol of length-prefixed packets. This crate
//! provides the pieces for talking to it:
//!
//! - [`codec`] frames and decodes packets from a byte stream.
//! - [`packet`] models every packet as a struct with named fields.
//! - [`routing`] dispatches decoded packets to per-type handlers.
//! - [`session`] tracks the connection phase and pumps received bytes.
//! - [`client`] drives a session over a Tokio TCP connection.

pub mod byte_order;
pub mod client;
pub mod codec;
pub mod metrics;
pub mod packet;
pub mod routing;
pub mod session;
pub mod transport;

pub use client::{AdminClient, ClientError, ClientHandle};
pub use codec::{CodecError, PacketCodec};
pub use metrics::{Direction, ERRORS_TOTAL, PACKETS_PROCESSED, SESSIONS_ACTIVE};
pub use packet::{Packet, PacketKind};
pub use routing::{HandlerContext, HandlerRegistry};
pub use session::{CloseReason, Credentials, Phase, Session, SessionError};
pub use transport::{CloseProgress, Transport};
