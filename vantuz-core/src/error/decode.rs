//! Response body decode errors.

use std::fmt;
use thiserror::Error;

/// Which unmarshal target a decode attempt was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetBand {
    /// Success target, status in `[200, 299]`.
    Success,
    /// Error target, status in `[400, 599]`.
    Error,
}

impl fmt::Display for TargetBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetBand::Success => write!(f, "success"),
            TargetBand::Error => write!(f, "error"),
        }
    }
}

/// A response body that did not match the shape of its unmarshal target.
///
/// The raw body is kept verbatim so the caller can see what the server
/// actually sent.
#[derive(Error, Debug)]
#[error("{} {source}. status: {status}, body: {body}", .band.prefix())]
pub struct DecodeError {
    /// Target the body was being decoded into
    pub band: TargetBand,
    /// HTTP status code of the exchange
    pub status: u16,
    /// Raw response body, lossily converted to UTF-8
    pub body: String,
    /// Underlying codec error
    #[source]
    pub source: serde_json::Error,
}

impl TargetBand {
    fn prefix(self) -> &'static str {
        match self {
            TargetBand::Success => "unmarshal response:",
            TargetBand::Error => "unmarshal response error:",
        }
    }
}

impl DecodeError {
    /// Creates a decode error from the raw body bytes.
    pub fn new(band: TargetBand, status: u16, body: &[u8], source: serde_json::Error) -> Self {
        Self {
            band,
            status,
            body: String::from_utf8_lossy(body).into_owned(),
            source,
        }
    }
}
