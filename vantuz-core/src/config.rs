//! Transport construction parameters.
//!
//! [`HttpConfig`] controls how the built-in reqwest transport is built. The
//! defaults match the standard client factory: a 20 second overall timeout
//! and the `vantuz` user agent.

use crate::error::{ConfigValidationError, ValidationResult};
use std::time::Duration;

/// User agent installed by [`Client::new`](crate::client::Client::new).
pub const DEFAULT_USER_AGENT: &str = "vantuz";

/// Overall request timeout installed by the standard factory.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Overall request timeout
    pub timeout: Duration,
    /// TCP connection timeout (default: 10 seconds)
    pub connect_timeout: Duration,
    /// Default User-Agent header value
    pub user_agent: String,
    /// Maximum number of idle keep-alive connections per host.
    ///
    /// Default: 10
    pub pool_max_idle_per_host: usize,
    /// Idle connections older than this are closed.
    ///
    /// Default: 90 seconds
    pub pool_idle_timeout: Duration,
    /// Optional proxy configuration
    pub proxy: Option<ProxyConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
            proxy: None,
        }
    }
}

impl HttpConfig {
    /// Validates the configuration.
    ///
    /// # Validation Rules
    ///
    /// - `timeout` of zero is an error
    /// - `timeout` above 5 minutes is an error
    /// - `timeout` below 1 second produces a warning
    /// - `connect_timeout` longer than `timeout` produces a warning
    ///
    /// ```rust
    /// use vantuz_core::config::HttpConfig;
    /// use std::time::Duration;
    ///
    /// assert!(HttpConfig::default().validate().is_ok());
    ///
    /// let config = HttpConfig {
    ///     timeout: Duration::from_secs(600),
    ///     ..Default::default()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> std::result::Result<ValidationResult, ConfigValidationError> {
        let max_timeout = Duration::from_secs(300);
        let mut warnings = Vec::new();

        if self.timeout.is_zero() {
            return Err(ConfigValidationError::invalid(
                "timeout",
                "timeout cannot be zero",
            ));
        }

        if self.timeout > max_timeout {
            return Err(ConfigValidationError::too_high(
                "timeout",
                format!("{:?}", self.timeout),
                "5 minutes",
            ));
        }

        if self.timeout < Duration::from_secs(1) {
            warnings.push(format!(
                "timeout {:?} is very short, may cause frequent timeouts",
                self.timeout
            ));
        }

        if self.connect_timeout > self.timeout {
            warnings.push(format!(
                "connect_timeout {:?} exceeds timeout {:?} and will never fire",
                self.connect_timeout, self.timeout
            ));
        }

        Ok(ValidationResult::with_warnings(warnings))
    }
}

/// Proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy URL (e.g., "http://127.0.0.1:8080").
    pub url: String,
    /// Optional username for authentication.
    pub username: Option<String>,
    /// Optional password for authentication.
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Create a new proxy configuration with just a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    /// Set credentials for the proxy.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}
