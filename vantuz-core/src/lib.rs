//! Vantuz Core Library
//!
//! Request pipeline behind the `vantuz` HTTP client: per-client defaults
//! copied into each request, optional rate limiting, and JSON decoding into
//! a success or error target chosen by status code.
//!
//! # Features
//!
//! - **Copy-on-seed defaults**: requests never alias client headers or query
//! - **Rate limiting**: evenly spaced permits, cancellable waits
//! - **Status-conditional decoding**: `2xx` into the result, `4xx`/`5xx` into the error
//! - **Pluggable transport and logging**: `reqwest` and no-op by default
//!
//! # Example
//!
//! ```rust,no_run
//! use vantuz_core::prelude::*;
//! use std::time::Duration;
//!
//! #[derive(Debug, Clone, Deserialize)]
//! struct ApiError {
//!     message: String,
//! }
//!
//! # async fn example() -> Result<()> {
//! let mut client = Client::new()?;
//! client.set_rate_limit(5, Duration::from_secs(1));
//!
//! let api_error = JsonTarget::<ApiError>::new();
//! let response = client
//!     .new_request()
//!     .set_error(Some(api_error.clone()))
//!     .get(&CancellationToken::new(), "https://api.example.com/items/42")
//!     .await?;
//!
//! if response.is_error() {
//!     println!("{:?}", api_error.get());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]

pub use serde;
pub use serde_json;

pub mod client;
pub mod config;
pub mod encoding;
pub mod error;
pub mod log_sink;
pub mod logging;
pub mod rate_limiter;
pub mod request;
pub mod response;
pub mod transport;
pub mod unmarshal;

pub use client::Client;
pub use config::{HttpConfig, ProxyConfig};
pub use encoding::QueryParams;
pub use error::{ContextExt, DecodeError, Error, NetworkError, Result, TargetBand, UrlError};
pub use log_sink::{Logger, NoopLogger, TracingLogger};
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
pub use request::Request;
pub use response::{Response, is_http_error, is_http_success};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
pub use unmarshal::{JsonTarget, Unmarshal};
// Execution takes a cancellation token
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports
///
/// ```rust
/// use vantuz_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::Client;
    pub use crate::config::{HttpConfig, ProxyConfig};
    pub use crate::encoding::QueryParams;
    pub use crate::error::{ContextExt, Error, Result};
    pub use crate::log_sink::{Logger, NoopLogger, TracingLogger};
    pub use crate::logging::{LogConfig, LogFormat, LogLevel, init_logging, try_init_logging};
    pub use crate::request::Request;
    pub use crate::response::Response;
    pub use crate::unmarshal::JsonTarget;
    pub use serde::{Deserialize, Serialize};
    pub use tokio_util::sync::CancellationToken;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
