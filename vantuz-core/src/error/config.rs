//! Configuration validation error types.

use std::fmt;
use thiserror::Error;

/// Configuration validation failures.
///
/// ```rust
/// use vantuz_core::error::ConfigValidationError;
///
/// let err = ConfigValidationError::too_high("timeout", "600s", "5 minutes");
/// assert_eq!(err.field_name(), "timeout");
/// assert!(err.to_string().contains("600s"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// Field value exceeds the maximum allowed value.
    #[error("Field '{field}' value {value} exceeds maximum {max}")]
    ValueTooHigh {
        /// The name of the configuration field
        field: &'static str,
        /// The actual value that was provided
        value: String,
        /// The maximum allowed value
        max: String,
    },

    /// Field value is invalid for reasons other than range.
    #[error("Field '{field}' has invalid value: {reason}")]
    ValueInvalid {
        /// The name of the configuration field
        field: &'static str,
        /// The reason why the value is invalid
        reason: String,
    },
}

impl ConfigValidationError {
    /// Returns the field name associated with this error.
    #[must_use]
    pub fn field_name(&self) -> &'static str {
        match self {
            ConfigValidationError::ValueTooHigh { field, .. }
            | ConfigValidationError::ValueInvalid { field, .. } => field,
        }
    }

    /// Creates a new `ValueTooHigh` error.
    pub fn too_high<V: fmt::Display, M: fmt::Display>(
        field: &'static str,
        value: V,
        max: M,
    ) -> Self {
        ConfigValidationError::ValueTooHigh {
            field,
            value: value.to_string(),
            max: max.to_string(),
        }
    }

    /// Creates a new `ValueInvalid` error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigValidationError::ValueInvalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Outcome of a successful validation: the configuration is usable but may
/// carry warnings about suboptimal values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// Human-readable warnings
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Creates an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a result carrying the given warnings.
    #[must_use]
    pub fn with_warnings(warnings: Vec<String>) -> Self {
        Self { warnings }
    }

    /// True when no warnings were raised.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.warnings.is_empty()
    }

    /// True when at least one warning was raised.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
