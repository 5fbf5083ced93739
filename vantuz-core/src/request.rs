//! Per-call request builder and execution pipeline.
//!
//! A [`Request`] starts as a copy of its [`Client`]'s defaults. Setters
//! consume and return the request so calls chain; the terminal methods
//! ([`get`](Request::get), [`post`](Request::post), ...) borrow it, so one
//! configured request can be sent any number of times.
//!
//! Execution runs these steps in order and stops at the first failure:
//!
//! 1. Parse the URL. Nothing is sent for a malformed URL.
//! 2. Build the outbound headers and body.
//! 3. Replace the URL query with the request's query parameters, if any.
//! 4. Wait for the client's rate limiter.
//! 5. Perform the exchange through the client's transport.
//! 6. Read the whole body. The body stream is closed on every path.
//! 7. Decode the body into the success or error target by status.
//! 8. Return the [`Response`].
//!
//! Every failure is reported to the client's [`Logger`](crate::log_sink::Logger)
//! with an empty context label and then returned.
//!
//! # Example
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use tokio_util::sync::CancellationToken;
//! use vantuz_core::client::Client;
//! use vantuz_core::unmarshal::JsonTarget;
//!
//! #[derive(Debug, Clone, Deserialize)]
//! struct Token {
//!     access_token: String,
//! }
//!
//! # async fn example() -> vantuz_core::Result<()> {
//! let client = Client::new()?;
//! let token = JsonTarget::<Token>::new();
//!
//! let response = client
//!     .new_request()
//!     .set_form_url_map([("grant_type", "device_code")])
//!     .set_result(Some(token.clone()))
//!     .post(&CancellationToken::new(), "https://auth.example.com/token")
//!     .await?;
//!
//! if response.is_success() {
//!     println!("{:?}", token.get());
//! }
//! # Ok(())
//! # }
//! ```

use crate::client::{CONTENT_LENGTH, CONTENT_TYPE, Client};
use crate::encoding::{FORM_CONTENT_TYPE, JSON_CONTENT_TYPE, QueryParams};
use crate::error::{ContextExt, Error, Result, UrlError};
use crate::response::Response;
use crate::transport::{BodyStream, TransportRequest, TransportResponse};
use crate::unmarshal::{Unmarshal, unmarshal_response};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use url::Url;

/// A single call's configuration, seeded from a [`Client`].
#[derive(Debug, Clone)]
pub struct Request<'c> {
    client: &'c Client,
    headers: HashMap<String, String>,
    query_params: Option<QueryParams>,
    body: String,
    result: Option<Arc<dyn Unmarshal>>,
    error: Option<Arc<dyn Unmarshal>>,
}

impl<'c> Request<'c> {
    pub(crate) fn new(
        client: &'c Client,
        headers: HashMap<String, String>,
        query_params: Option<QueryParams>,
    ) -> Self {
        Self {
            client,
            headers,
            query_params,
            body: String::new(),
            result: None,
            error: None,
        }
    }

    /// Registers the target decoded from error-band (`4xx`/`5xx`) bodies.
    ///
    /// `None` keeps whatever target was registered before.
    pub fn set_error<U: Unmarshal + 'static>(mut self, target: Option<U>) -> Self {
        if let Some(target) = target {
            self.error = Some(Arc::new(target));
        }
        self
    }

    /// Registers the target decoded from success-band (`2xx`) bodies.
    ///
    /// `None` keeps whatever target was registered before.
    pub fn set_result<U: Unmarshal + 'static>(mut self, target: Option<U>) -> Self {
        if let Some(target) = target {
            self.result = Some(Arc::new(target));
        }
        self
    }

    /// Sends `values` as an `application/x-www-form-urlencoded` body.
    ///
    /// Empty `values` leave the request untouched.
    pub fn set_form_url_values(self, values: &QueryParams) -> Self {
        if values.is_empty() {
            return self;
        }
        let body = values.encode();
        self.with_body(body, FORM_CONTENT_TYPE)
    }

    /// Sends single-valued pairs as an `application/x-www-form-urlencoded`
    /// body.
    ///
    /// An empty map leaves the request untouched.
    pub fn set_form_url_map<I, K, V>(self, map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values: QueryParams = map.into_iter().collect();
        self.set_form_url_values(&values)
    }

    /// Sends `text` verbatim as an `application/json` body.
    ///
    /// Unlike the form setters an empty string is applied.
    pub fn set_json_string(self, text: impl Into<String>) -> Self {
        self.with_body(text.into(), JSON_CONTENT_TYPE)
    }

    /// Sets one header for this request only.
    pub fn set_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replaces the query parameters.
    pub fn set_query_params(mut self, params: QueryParams) -> Self {
        self.query_params = Some(params);
        self
    }

    /// Query parameters, absent until seeded by the client or set.
    pub fn query_params(&self) -> Option<&QueryParams> {
        self.query_params.as_ref()
    }

    /// Mutable query parameters, created empty if absent.
    pub fn query_params_mut(&mut self) -> &mut QueryParams {
        self.query_params.get_or_insert_with(QueryParams::new)
    }

    /// Headers this request will send.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Body this request will send; empty means none.
    pub fn body(&self) -> &str {
        &self.body
    }

    fn with_body(mut self, body: String, content_type: &str) -> Self {
        self.headers
            .insert(CONTENT_TYPE.to_string(), content_type.to_string());
        self.headers
            .insert(CONTENT_LENGTH.to_string(), body.len().to_string());
        self.body = body;
        self
    }

    /// Sends a `GET`.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn get(&self, cancel: &CancellationToken, url: &str) -> Result<Response> {
        self.execute(cancel, Method::GET, url).await
    }

    /// Sends a `POST`.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn post(&self, cancel: &CancellationToken, url: &str) -> Result<Response> {
        self.execute(cancel, Method::POST, url).await
    }

    /// Sends a `PUT`.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn put(&self, cancel: &CancellationToken, url: &str) -> Result<Response> {
        self.execute(cancel, Method::PUT, url).await
    }

    /// Sends a `PATCH`.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn patch(&self, cancel: &CancellationToken, url: &str) -> Result<Response> {
        self.execute(cancel, Method::PATCH, url).await
    }

    /// Sends a `DELETE`.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn delete(&self, cancel: &CancellationToken, url: &str) -> Result<Response> {
        self.execute(cancel, Method::DELETE, url).await
    }

    /// Runs the pipeline for `method` against `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `url` is malformed ([`Error::InvalidUrl`]); nothing is sent
    /// - a header cannot be carried over HTTP ([`Error::InvalidHeader`])
    /// - `cancel` fires while waiting for the rate limiter, during the
    ///   exchange or while reading the body ([`Error::Cancelled`])
    /// - the transport fails ([`Error::Network`])
    /// - the body does not decode into the chosen target ([`Error::Decode`])
    #[instrument(
        name = "vantuz_execute",
        skip_all,
        fields(method = %method, url = %url)
    )]
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        method: Method,
        url: &str,
    ) -> Result<Response> {
        let result = self.run(cancel, method, url).await;
        if let Err(err) = &result {
            self.client.logger().error("", err);
        }
        result
    }

    async fn run(&self, cancel: &CancellationToken, method: Method, url: &str) -> Result<Response> {
        let logger = self.client.logger();
        logger.debug(format_args!("{method}: {url}"));

        let mut target = parse_url(url)?;
        let headers = self.header_map()?;

        if let Some(query) = &self.query_params
            && !query.is_empty()
        {
            let encoded = query.encode();
            logger.debug(format_args!("query: {encoded}"));
            target.set_query(Some(&encoded));
        }

        let label = format!("{method} {url}");
        let request = TransportRequest {
            method,
            url: target,
            headers,
            body: self.body.clone(),
        };

        if let Some(limiter) = self.client.rate_limiter() {
            limiter.wait(cancel).await?;
        }

        let TransportResponse {
            status,
            headers,
            body,
        } = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::cancelled("request cancelled")),
            response = self.client.transport().perform(request) => {
                response.with_context(|| label.clone())?
            }
        };

        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::cancelled("response body read cancelled")),
            body = read_body(body) => body.with_context(|| label)?,
        };
        logger.debug(format_args!("status: {status}, {} bytes", body.len()));

        unmarshal_response(
            status.as_u16(),
            &body,
            self.result.as_deref(),
            self.error.as_deref(),
        )?;

        Ok(Response::new(status, headers, body, self.error.clone()))
    }

    fn header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_header(name.as_str(), e.to_string()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_header(name.as_str(), e.to_string()))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

/// Parses an absolute URL, rejecting ASCII control characters that the
/// `url` crate would otherwise percent-encode silently.
fn parse_url(input: &str) -> Result<Url> {
    if let Some(position) = input.find(|c: char| c.is_ascii_control()) {
        return Err(Error::invalid_url(
            input,
            UrlError::ControlCharacter { position },
        ));
    }
    Url::parse(input).map_err(|e| Error::invalid_url(input, e))
}

async fn read_body(mut body: BodyStream) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}
