//! Client callback types.

use std::{future::Future, pin::Pin, sync::Arc};

use super::ClientError;

/// A boxed future that is `Send` with a specified lifetime.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handler invoked when the runtime hits an error it recovers from, such
/// as a failing packet handler or a packet that could not be encoded.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use adminport::client::ClientErrorHandler;
///
/// let handler: ClientErrorHandler = Arc::new(|err| {
///     let message = err.to_string();
///     Box::pin(async move {
///         eprintln!("admin client error: {message}");
///     })
/// });
/// ```
pub type ClientErrorHandler =
    Arc<dyn for<'a> Fn(&'a ClientError) -> BoxFuture<'a, ()> + Send + Sync>;
