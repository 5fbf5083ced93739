//! # Error Handling
//!
//! Every fallible operation in the crate returns [`Result<T>`], whose error
//! type is the [`Error`] enum below. The variants map one-to-one onto the
//! stages of a request execution so callers can tell *where* a call failed:
//!
//! ```text
//! Error
//! ├── InvalidUrl    - target URL rejected before any network activity
//! ├── InvalidHeader - header name/value the transport cannot carry
//! ├── Cancelled     - cancellation fired during limiter wait or exchange
//! ├── Network       - transport failure (via NetworkError); no Response
//! ├── Decode        - JSON body did not match the unmarshal target
//! ├── Config        - invalid HttpConfig (via ConfigValidationError)
//! └── Context       - error with additional context
//! ```
//!
//! ## Example
//!
//! ```rust
//! use vantuz_core::error::{Error, Result, ContextExt};
//!
//! fn connect() -> Result<()> {
//!     Err(Error::network("Connection refused"))
//! }
//!
//! let err = connect().context("GET https://example.com/health").unwrap_err();
//! assert!(err.is_network());
//! assert_eq!(err.to_string(), "GET https://example.com/health");
//! ```
//!
//! ## Cancellation
//!
//! ```rust
//! use vantuz_core::error::Error;
//!
//! let err = Error::cancelled("rate limiter wait cancelled").context("GET https://example.com");
//! assert!(err.is_cancelled());
//! ```

mod config;
mod context;
mod convert;
mod decode;
mod network;
mod url;

use std::borrow::Cow;
use std::error::Error as StdError;
use thiserror::Error;

pub use config::{ConfigValidationError, ValidationResult};
pub use context::ContextExt;
pub use decode::{DecodeError, TargetBand};
pub use network::NetworkError;
pub use self::url::UrlError;

/// Result type alias for every vantuz operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error type.
///
/// Large variants are boxed to keep the enum small; the decode variant in
/// particular carries the whole response body.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The target URL could not be parsed. No request was sent.
    #[error("Invalid URL '{input}': {source}")]
    InvalidUrl {
        /// The URL string as supplied by the caller
        input: String,
        /// Why it was rejected
        #[source]
        source: UrlError,
    },

    /// A header name or value could not be encoded for the wire.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as configured
        name: String,
        /// What was wrong with it
        reason: Cow<'static, str>,
    },

    /// The caller's cancellation token fired.
    #[error("Cancelled: {0}")]
    Cancelled(Cow<'static, str>),

    /// Transport-level failure. Boxed to reduce enum size.
    #[error("Network error: {0}")]
    Network(Box<NetworkError>),

    /// The response body did not decode into the unmarshal target.
    #[error(transparent)]
    Decode(Box<DecodeError>),

    /// The HTTP configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),

    /// Error with additional context, preserving the error chain.
    #[error("{context}")]
    Context {
        /// Context message describing what operation failed
        context: String,
        /// The underlying error
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    // ==================== Constructor Methods ====================

    /// Creates an invalid URL error.
    pub fn invalid_url(input: impl Into<String>, source: impl Into<UrlError>) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            source: source.into(),
        }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a cancelled error.
    ///
    /// Accepts both `&'static str` (zero allocation) and `String`.
    pub fn cancelled(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Creates a network error from a message.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(Box::new(NetworkError::ConnectionFailed(msg.into())))
    }

    /// Creates a network error from any transport error type.
    pub fn transport<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Network(Box::new(NetworkError::Transport(Box::new(err))))
    }

    // ==================== Context Methods ====================

    /// Attaches context to an existing error.
    ///
    /// ```rust
    /// use vantuz_core::error::Error;
    ///
    /// let err = Error::network("Connection refused").context("GET https://example.com");
    /// assert_eq!(err.to_string(), "GET https://example.com");
    /// ```
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    // ==================== Chain Traversal Methods ====================

    fn iter_chain(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |err| match err {
            Error::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        })
    }

    /// Returns the root cause of the error, skipping Context layers.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        self.iter_chain().last().unwrap_or(self)
    }

    /// Generates a detailed error report with the full chain.
    ///
    /// ```rust
    /// use vantuz_core::error::Error;
    ///
    /// let err = Error::network("Connection refused").context("POST https://example.com/token");
    /// let report = err.report();
    /// assert!(report.starts_with("POST https://example.com/token"));
    /// assert!(report.contains("Caused by: Network error"));
    /// ```
    #[must_use]
    pub fn report(&self) -> String {
        use std::fmt::Write;
        let mut report = self.to_string();

        let mut current: Option<&(dyn StdError + 'static)> = self.source();
        while let Some(err) = current {
            let _ = write!(report, "\nCaused by: {err}");
            current = err.source();
        }
        report
    }

    // ==================== Helper Methods (Context Penetrating) ====================

    /// True if the caller's cancellation token aborted the operation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), Error::Cancelled(_))
    }

    /// True for URL parse failures.
    #[must_use]
    pub fn is_invalid_url(&self) -> bool {
        matches!(self.root_cause(), Error::InvalidUrl { .. })
    }

    /// True for transport-level failures.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self.root_cause(), Error::Network(_))
    }

    /// True if the transport reported a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self.root_cause() {
            Error::Network(ne) => matches!(ne.as_ref(), NetworkError::Timeout),
            _ => false,
        }
    }

    /// Returns the decode failure details, if this is a decode error.
    #[must_use]
    pub fn as_decode(&self) -> Option<&DecodeError> {
        match self.root_cause() {
            Error::Decode(details) => Some(details.as_ref()),
            _ => None,
        }
    }
}
