//! Error types for admin port client operations.

use std::io;

use crate::session::SessionError;

/// Errors emitted by [`AdminClient`](super::AdminClient) and
/// [`ClientHandle`](super::ClientHandle).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Socket setup, connection or read failure.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// The session rejected an operation or a handler failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    /// Name resolution produced no usable address.
    #[error("no address found for {0}")]
    Resolve(String),
    /// The client runtime is no longer running.
    #[error("client has stopped")]
    Stopped,
    /// The socket writer task panicked or was cancelled.
    #[error("writer task failed: {0}")]
    WriterTask(#[from] tokio::task::JoinError),
}
