//! Status-conditional JSON decoding.
//!
//! A request may carry two unmarshal targets: one for the success band
//! (`[200, 299]`) and one for the error band (`[400, 599]`). After the body
//! has been read, at most one of them is populated, chosen by status code
//! alone. Any other status, or an empty body, decodes nothing.
//!
//! Targets are type-erased behind [`Unmarshal`] so a request can hold any
//! caller type. [`JsonTarget`] is the standard implementation: a shared
//! slot the caller keeps a clone of and reads after the call.
//!
//! ```rust
//! use serde::Deserialize;
//! use vantuz_core::unmarshal::{JsonTarget, Unmarshal};
//!
//! #[derive(Debug, Clone, Deserialize)]
//! struct ApiError {
//!     message: String,
//! }
//!
//! let target = JsonTarget::<ApiError>::new();
//! target.unmarshal(br#"{"message":"not found"}"#).unwrap();
//! assert_eq!(target.get().unwrap().message, "not found");
//! ```

use crate::error::{DecodeError, Result, TargetBand};
use crate::response::{is_http_error, is_http_success};
use serde::de::DeserializeOwned;
use std::any::{Any, type_name};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Anything that can be populated from a JSON body.
pub trait Unmarshal: Send + Sync + fmt::Debug {
    /// Decodes `body` into `self`.
    fn unmarshal(&self, body: &[u8]) -> std::result::Result<(), serde_json::Error>;

    /// Upcast used to recover the concrete target type.
    fn as_any(&self) -> &dyn Any;
}

/// Shared, typed unmarshal target.
///
/// Clones point at the same slot: hand one clone to the request and keep
/// another to read the decoded value.
pub struct JsonTarget<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> JsonTarget<T> {
    /// Creates an empty target.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True once a body has been decoded into this target.
    pub fn is_populated(&self) -> bool {
        self.lock().is_some()
    }

    /// Takes the decoded value out, leaving the target empty.
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    /// Runs `f` against the decoded value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.lock().as_ref())
    }

    /// True if `other` shares this target's slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<T: Clone> JsonTarget<T> {
    /// Returns a copy of the decoded value.
    pub fn get(&self) -> Option<T> {
        self.lock().clone()
    }
}

impl<T> Clone for JsonTarget<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for JsonTarget<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonTarget<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonTarget")
            .field("type", &type_name::<T>())
            .field("populated", &self.is_populated())
            .finish()
    }
}

impl<T> Unmarshal for JsonTarget<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn unmarshal(&self, body: &[u8]) -> std::result::Result<(), serde_json::Error> {
        let value = serde_json::from_slice::<T>(body)?;
        *self.lock() = Some(value);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Decodes `body` into whichever target matches `status`.
///
/// The error target is checked first; a status can only ever fall in one
/// band, so the order never changes the outcome.
///
/// # Errors
///
/// Returns [`Error::Decode`](crate::error::Error::Decode) with the raw body
/// when the chosen target rejects it.
pub fn unmarshal_response(
    status: u16,
    body: &[u8],
    success: Option<&dyn Unmarshal>,
    error: Option<&dyn Unmarshal>,
) -> Result<()> {
    if body.is_empty() {
        return Ok(());
    }

    if let Some(target) = error
        && is_http_error(status)
    {
        return target
            .unmarshal(body)
            .map_err(|e| DecodeError::new(TargetBand::Error, status, body, e).into());
    }

    if let Some(target) = success
        && is_http_success(status)
    {
        return target
            .unmarshal(body)
            .map_err(|e| DecodeError::new(TargetBand::Success, status, body, e).into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Payload {
        id: u32,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct ApiError {
        message: String,
    }

    #[test]
    fn test_json_target_clones_share_slot() {
        let target = JsonTarget::<Payload>::new();
        let handle = target.clone();
        assert!(target.ptr_eq(&handle));

        handle.unmarshal(br#"{"id":7}"#).unwrap();
        assert_eq!(target.get(), Some(Payload { id: 7 }));
        assert!(target.is_populated());

        assert_eq!(target.take(), Some(Payload { id: 7 }));
        assert!(!handle.is_populated());
    }

    #[test]
    fn test_json_target_with() {
        let target = JsonTarget::<Payload>::new();
        assert!(target.with(|v| v.is_none()));
        target.unmarshal(br#"{"id":1}"#).unwrap();
        assert_eq!(target.with(|v| v.map(|p| p.id)), Some(1));
    }

    #[test]
    fn test_json_target_debug() {
        let target = JsonTarget::<Payload>::new();
        let debug = format!("{target:?}");
        assert!(debug.contains("Payload"));
        assert!(debug.contains("populated: false"));
    }

    #[test]
    fn test_error_band_populates_error_target() {
        let ok = JsonTarget::<Payload>::new();
        let err = JsonTarget::<ApiError>::new();

        unmarshal_response(404, br#"{"message":"not found"}"#, Some(&ok), Some(&err)).unwrap();

        assert!(!ok.is_populated());
        assert_eq!(err.get().unwrap().message, "not found");
    }

    #[test]
    fn test_success_band_populates_success_target() {
        let ok = JsonTarget::<Payload>::new();
        let err = JsonTarget::<ApiError>::new();

        unmarshal_response(201, br#"{"id":3}"#, Some(&ok), Some(&err)).unwrap();

        assert_eq!(ok.get(), Some(Payload { id: 3 }));
        assert!(!err.is_populated());
    }

    #[test]
    fn test_other_bands_decode_nothing() {
        let ok = JsonTarget::<Payload>::new();
        let err = JsonTarget::<ApiError>::new();

        for status in [100, 101, 199, 300, 302, 399, 600] {
            unmarshal_response(status, b"not json at all", Some(&ok), Some(&err)).unwrap();
        }
        assert!(!ok.is_populated());
        assert!(!err.is_populated());
    }

    #[test]
    fn test_missing_target_for_band_is_not_an_error() {
        let ok = JsonTarget::<Payload>::new();
        unmarshal_response(500, b"<html>", Some(&ok), None).unwrap();
        assert!(!ok.is_populated());

        let err = JsonTarget::<ApiError>::new();
        unmarshal_response(200, b"<html>", None, Some(&err)).unwrap();
        assert!(!err.is_populated());
    }

    #[test]
    fn test_empty_body_skips_decoding() {
        let ok = JsonTarget::<Payload>::new();
        let err = JsonTarget::<ApiError>::new();
        unmarshal_response(200, b"", Some(&ok), Some(&err)).unwrap();
        unmarshal_response(404, b"", Some(&ok), Some(&err)).unwrap();
        assert!(!ok.is_populated());
        assert!(!err.is_populated());
    }

    #[test]
    fn test_decode_failure_carries_raw_body() {
        let ok = JsonTarget::<Payload>::new();
        let e = unmarshal_response(200, b"Hello.", Some(&ok), None).unwrap_err();

        let details = e.as_decode().unwrap();
        assert_eq!(details.band, TargetBand::Success);
        assert_eq!(details.status, 200);
        assert_eq!(details.body, "Hello.");
        assert!(e.to_string().contains("Hello."));
        assert!(!ok.is_populated());
    }

    #[test]
    fn test_error_band_decode_failure() {
        let err = JsonTarget::<ApiError>::new();
        let e = unmarshal_response(503, br#"{"msg":1}"#, None, Some(&err)).unwrap_err();
        let details = e.as_decode().unwrap();
        assert_eq!(details.band, TargetBand::Error);
        assert!(e.to_string().starts_with("unmarshal response error:"));
    }
}
