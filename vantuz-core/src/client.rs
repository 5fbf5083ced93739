//! Shared client configuration.
//!
//! A [`Client`] owns everything that outlives a single call: the transport,
//! the optional rate limiter, the logging sink, and the default headers and
//! query parameters that seed every [`Request`].
//!
//! Requests receive *copies* of the defaults. Changing the client later
//! affects only requests created afterwards, and a request's own edits never
//! leak back into the client.
//!
//! # Example
//!
//! ```rust,no_run
//! use vantuz_core::client::Client;
//! use std::time::Duration;
//!
//! # fn example() -> vantuz_core::Result<()> {
//! let mut client = Client::new()?;
//! client
//!     .set_authorization("Bearer token")
//!     .set_global_header("X-Api-Version", "2")
//!     .set_rate_limit(5, Duration::from_secs(1));
//!
//! let request = client.new_request();
//! # Ok(())
//! # }
//! ```

use crate::config::HttpConfig;
use crate::encoding::{JSON_CONTENT_TYPE, QueryParams};
use crate::error::Result;
use crate::log_sink::{Logger, NoopLogger};
use crate::rate_limiter::RateLimiter;
use crate::request::Request;
use crate::transport::{ReqwestTransport, Transport};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";
/// `Content-Length` header name.
pub const CONTENT_LENGTH: &str = "Content-Length";
/// `User-Agent` header name.
pub const USER_AGENT: &str = "User-Agent";
/// `Authorization` header name.
pub const AUTHORIZATION: &str = "Authorization";

/// HTTP client holding per-client defaults.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    rate_limiter: Option<RateLimiter>,
    headers: HashMap<String, String>,
    query_params: QueryParams,
    logger: Arc<dyn Logger>,
}

impl Client {
    /// Creates a client with the standard defaults: 20 second timeout,
    /// `Content-Type: application/json`, the `vantuz` user agent, no rate
    /// limit and a no-op logger.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpConfig::default())
    }

    /// Creates a client whose transport is built from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation or the HTTP client
    /// cannot be built.
    pub fn with_config(config: HttpConfig) -> Result<Self> {
        let validation = config.validate()?;
        for warning in &validation.warnings {
            warn!(warning = %warning, "HTTP configuration warning");
        }

        let transport = ReqwestTransport::new(&config)?;
        let mut client = Self::with_transport(Arc::new(transport));
        client.set_user_agent(config.user_agent);
        Ok(client)
    }

    /// Creates a client around an existing transport, with the standard
    /// header defaults.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        let mut client = Self {
            transport,
            rate_limiter: None,
            headers: HashMap::new(),
            query_params: QueryParams::new(),
            logger: Arc::new(NoopLogger),
        };
        client
            .set_global_header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .set_user_agent(crate::config::DEFAULT_USER_AGENT);
        client
    }

    /// Creates a request seeded with copies of this client's defaults.
    pub fn new_request(&self) -> Request<'_> {
        let query_params = (!self.query_params.is_empty()).then(|| self.query_params.clone());
        Request::new(self, self.headers.clone(), query_params)
    }

    /// Sets a header sent by every request created afterwards.
    pub fn set_global_header(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets every header in `headers`; existing names are overwritten,
    /// nothing is removed.
    pub fn set_global_headers<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.set_global_header(name, value);
        }
        self
    }

    /// Sets the `User-Agent` default header.
    pub fn set_user_agent(&mut self, value: impl Into<String>) -> &mut Self {
        self.set_global_header(USER_AGENT, value)
    }

    /// Sets the `Authorization` default header.
    pub fn set_authorization(&mut self, value: impl Into<String>) -> &mut Self {
        self.set_global_header(AUTHORIZATION, value)
    }

    /// Replaces the default query parameters.
    pub fn set_global_query_params(&mut self, params: QueryParams) -> &mut Self {
        self.query_params = params;
        self
    }

    /// Limits requests to `max_requests` evenly spaced over `per`.
    ///
    /// `max_requests == 0` or a zero `per` removes the limit.
    pub fn set_rate_limit(&mut self, max_requests: u32, per: Duration) -> &mut Self {
        self.rate_limiter = RateLimiter::per(max_requests, per);
        self
    }

    /// Replaces the logging sink.
    pub fn set_logger<L: Logger + 'static>(&mut self, logger: L) {
        self.logger = Arc::new(logger);
    }

    /// Replaces the transport. `None` keeps the current one.
    pub fn set_transport(&mut self, transport: Option<Arc<dyn Transport>>) {
        if let Some(transport) = transport {
            self.transport = transport;
        }
    }

    /// Default headers.
    pub fn global_headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Default query parameters.
    pub fn global_query_params(&self) -> &QueryParams {
        &self.query_params
    }

    /// Installed rate limiter, if any.
    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.rate_limiter.as_ref()
    }

    /// Installed logging sink.
    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    /// Installed transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}
