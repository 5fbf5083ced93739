//! Labelling failed results.

use crate::error::{Error, Result};

/// Attaches a label to the error of a [`Result`], keeping the original as
/// its source.
///
/// The request pipeline uses it to tag transport failures with
/// `"{method} {url}"`; predicates such as [`Error::is_network`] still see
/// the underlying cause.
///
/// ```rust
/// use vantuz_core::error::{ContextExt, Error, Result};
///
/// fn send() -> Result<()> {
///     Err(Error::network("connection reset"))
/// }
///
/// let err = send()
///     .with_context(|| format!("{} {}", "GET", "https://example.com/items"))
///     .unwrap_err();
/// assert_eq!(err.to_string(), "GET https://example.com/items");
/// assert!(err.is_network());
/// ```
pub trait ContextExt<T> {
    /// Wraps the error in `label`.
    fn context(self, label: impl Into<String>) -> Result<T>;

    /// Wraps the error in a label built only on the error path.
    fn with_context<S, F>(self, label: F) -> Result<T>
    where
        S: Into<String>,
        F: FnOnce() -> S;
}

impl<T> ContextExt<T> for Result<T> {
    fn context(self, label: impl Into<String>) -> Result<T> {
        self.map_err(|err| err.context(label))
    }

    fn with_context<S, F>(self, label: F) -> Result<T>
    where
        S: Into<String>,
        F: FnOnce() -> S,
    {
        self.map_err(|err: Error| err.context(label()))
    }
}
