//! URL validation errors.

use thiserror::Error;

/// Reasons a target URL is rejected before a request is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UrlError {
    /// The input contains an ASCII control character.
    #[error("invalid control character in URL at byte {position}")]
    ControlCharacter {
        /// Byte offset of the first offending character
        position: usize,
    },

    /// The `url` crate refused the input.
    #[error(transparent)]
    Parse(#[from] url::ParseError),
}
