//! Completed exchange.
//!
//! A [`Response`] only exists for an exchange that reached the server and
//! whose body was read in full; transport failures never produce one.

use crate::unmarshal::{JsonTarget, Unmarshal};
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// True for status codes in `[200, 299]`.
pub const fn is_http_success(status: u16) -> bool {
    status >= 200 && status <= 299
}

/// True for status codes in `[400, 599]`.
pub const fn is_http_error(status: u16) -> bool {
    status >= 400 && status <= 599
}

/// Result of a successful exchange.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    error_target: Option<Arc<dyn Unmarshal>>,
}

impl Response {
    pub(crate) fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        error_target: Option<Arc<dyn Unmarshal>>,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            error_target,
        }
    }

    /// Status code in `[400, 599]`.
    pub fn is_error(&self) -> bool {
        is_http_error(self.status.as_u16())
    }

    /// Status code in `[200, 299]`.
    pub fn is_success(&self) -> bool {
        is_http_success(self.status.as_u16())
    }

    /// The target registered with `Request::set_error`, as given.
    ///
    /// It is returned whether or not it was populated; check
    /// [`is_error`](Self::is_error) first.
    pub fn error_target(&self) -> Option<&Arc<dyn Unmarshal>> {
        self.error_target.as_ref()
    }

    /// Typed view of [`error_target`](Self::error_target).
    ///
    /// Returns `None` if no error target was set or if it is not a
    /// `JsonTarget<T>`.
    pub fn error<T: Send + 'static>(&self) -> Option<JsonTarget<T>> {
        self.error_target
            .as_ref()?
            .as_any()
            .downcast_ref::<JsonTarget<T>>()
            .cloned()
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON regardless of status.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}
