//! Structured logging system.
//!
//! Installs a `tracing-subscriber` registry for applications that want the
//! client's events on stderr. Supports:
//! - Multi-level logging (TRACE, DEBUG, INFO, WARN, ERROR)
//! - `RUST_LOG` environment variable override
//! - Pretty, compact and JSON output

use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Most detailed debugging information.
    Trace,
    /// Detailed debugging information, including every pipeline step.
    Debug,
    /// Important events.
    Info,
    /// Potential issues.
    Warn,
    /// Failed requests.
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable formatted output.
    Pretty,
    /// Compact format.
    Compact,
    /// JSON format for production environments.
    Json,
}

/// Log configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level.
    pub level: LogLevel,
    /// Log format.
    pub format: LogFormat,
    /// Whether to show thread IDs.
    pub show_thread_ids: bool,
    /// Whether to show target module.
    pub show_target: bool,
    /// Whether to show span events (enter/close).
    pub show_span_events: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            show_thread_ids: false,
            show_target: true,
            show_span_events: false,
        }
    }
}

impl LogConfig {
    /// Configuration for development: debug level, span events on.
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            show_span_events: true,
            ..Self::default()
        }
    }

    /// Configuration for production: JSON lines with thread IDs.
    pub fn production() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            show_thread_ids: true,
            show_target: true,
            show_span_events: false,
        }
    }

    /// Configuration for tests: warnings only, compact.
    pub fn test() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            show_thread_ids: false,
            show_target: false,
            show_span_events: false,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("vantuz_core={}", self.level)))
    }

    fn span_events(&self) -> FmtSpan {
        if self.show_span_events {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_thread_ids(self.show_thread_ids)
            .with_target(self.show_target)
            .with_span_events(self.span_events());

        match self.format {
            LogFormat::Pretty => base.pretty().with_filter(self.env_filter()).boxed(),
            LogFormat::Compact => base.compact().with_filter(self.env_filter()).boxed(),
            LogFormat::Json => base.json().with_filter(self.env_filter()).boxed(),
        }
    }
}

/// Initializes the logging system.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed; use
/// [`try_init_logging`] where that can happen.
///
/// ```no_run
/// use vantuz_core::logging::{init_logging, LogConfig};
///
/// init_logging(&LogConfig::development());
/// ```
pub fn init_logging(config: &LogConfig) {
    tracing_subscriber::registry().with(config.layer()).init();
}

/// Attempts to initialize the logging system.
///
/// Suitable for test environments where multiple calls must not panic.
pub fn try_init_logging(config: &LogConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry().with(config.layer()).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_log_config_presets() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Pretty);

        let config = LogConfig::development();
        assert_eq!(config.level, LogLevel::Debug);
        assert!(config.show_span_events);

        let config = LogConfig::production();
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.show_thread_ids);

        let config = LogConfig::test();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn test_try_init_logging_twice() {
        let _ = try_init_logging(&LogConfig::test());
        assert!(try_init_logging(&LogConfig::test()).is_err());
    }
}
