//! # Vantuz
//!
//! A fluent HTTP client for REST-style APIs. A [`Client`] holds the shared
//! defaults (headers, query parameters, rate limit, logger, transport); each
//! [`Request`] starts from a copy of them, adds its own body and targets, and
//! decodes the response into the success or error target by status code.
//!
//! ## Features
//!
//! - **Async/Await**: Built on tokio, every call takes a cancellation token
//! - **Fluent requests**: chained setters, one terminal method per HTTP verb
//! - **Rate limiting**: evenly spaced permits shared by all requests of a client
//! - **Typed errors**: decode failures keep the status and the raw body
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vantuz::prelude::*;
//!
//! #[derive(Debug, Clone, Deserialize)]
//! struct Repo {
//!     full_name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::new()?;
//!     client.set_authorization("Bearer token");
//!
//!     let repo = JsonTarget::<Repo>::new();
//!     client
//!         .new_request()
//!         .set_result(Some(repo.clone()))
//!         .get(&CancellationToken::new(), "https://api.github.com/repos/rust-lang/rust")
//!         .await?;
//!
//!     println!("{:?}", repo.get());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Re-export core types and traits
pub use vantuz_core::{
    CancellationToken, Client, ContextExt, DecodeError, Error, HttpConfig, JsonTarget, Logger,
    NetworkError, NoopLogger, ProxyConfig, QueryParams, RateLimiter, RateLimiterConfig, Request,
    Response, Result, TargetBand, TracingLogger, Transport, TransportRequest, TransportResponse,
    Unmarshal, UrlError, is_http_error, is_http_success,
};

// Module paths for less common items
pub use vantuz_core::{
    client, config, encoding, error, log_sink, logging, rate_limiter, request, response,
    transport, unmarshal,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use vantuz_core::prelude::*;
}
