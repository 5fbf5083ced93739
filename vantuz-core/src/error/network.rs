//! Transport-level error types.

use std::error::Error as StdError;
use thiserror::Error;

/// Encapsulated transport errors.
///
/// Hides the concrete HTTP library behind a small set of variants so that a
/// custom [`Transport`](crate::transport::Transport) can report failures in
/// the same shape as the built-in reqwest transport.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NetworkError {
    /// The exchange did not complete within the transport's timeout.
    #[error("Request timeout")]
    Timeout,

    /// Connection could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The response body could not be read to completion.
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// Opaque transport error for anything else.
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync + 'static>),
}
