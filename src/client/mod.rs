//! Tokio runtime for admin port sessions.
//!
//! [`AdminClient`] owns a TCP connection split into a read half, polled by
//! [`AdminClient::run`], and a write half drained by a background task. The
//! [`Session`](crate::session::Session) in between writes through a
//! [`ChannelTransport`] so it never awaits.

mod builder;
mod config;
mod error;
mod hooks;
mod runtime;
mod writer;

pub use builder::AdminClientBuilder;
pub use config::{DEFAULT_CLOSE_TIMEOUT, SocketOptions};
pub use error::ClientError;
pub use hooks::{BoxFuture, ClientErrorHandler};
pub use runtime::{AdminClient, ClientHandle};
pub use writer::ChannelTransport;

#[cfg(test)]
mod tests;
