//! Transport capability.
//!
//! A [`Transport`] performs one fully-formed HTTP exchange. The request
//! pipeline builds a [`TransportRequest`], hands it over, and receives a
//! [`TransportResponse`] whose body is still a stream; reading and closing
//! that stream is the pipeline's job.
//!
//! [`ReqwestTransport`] is the default, built from an [`HttpConfig`].

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::fmt;
use tracing::{debug, instrument};
use url::Url;

/// Response body as a stream of chunks. Dropping it closes the body.
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// Outbound exchange descriptor.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute target URL, query already applied
    pub url: Url,
    /// Headers to send
    pub headers: HeaderMap,
    /// Request body; empty means no body
    pub body: String,
}

/// Raw exchange result as returned by a transport.
pub struct TransportResponse {
    /// Response status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Unread response body
    pub body: BodyStream,
}

impl TransportResponse {
    /// Builds a response from an in-memory body.
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            status,
            headers,
            body: stream::once(async move { Ok(body) }).boxed(),
        }
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Performs HTTP exchanges.
///
/// Implementations report failures as [`Error::Network`]. Timeouts belong
/// here too: the pipeline adds none of its own.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends `request` and returns the status, headers and unread body.
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds the underlying client from `config`.
    ///
    /// The configured user agent is *not* installed on the reqwest client;
    /// the [`Client`](crate::client::Client) sends it as a regular header so
    /// that it can be overridden like any other default.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The proxy URL is invalid
    /// - The HTTP client cannot be built
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .gzip(true);

        if let Some(proxy_config) = &config.proxy {
            let mut proxy = reqwest::Proxy::all(&proxy_config.url)
                .map_err(|e| Error::network(format!("Invalid proxy URL: {e}")))?;

            if let (Some(username), Some(password)) =
                (&proxy_config.username, &proxy_config.password)
            {
                proxy = proxy.basic_auth(username, password);
            }
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Wraps an already configured reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(
        name = "transport_perform",
        skip(self, request),
        fields(method = %request.method, url = %request.url, status)
    )]
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url).headers(headers);
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        tracing::Span::current().record("status", status.as_u16());
        debug!(status = %status, "HTTP response headers received");

        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map_err(Error::from)
            .boxed();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;

    #[test]
    fn test_reqwest_transport_creation() {
        assert!(ReqwestTransport::new(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_reqwest_transport_with_proxy() {
        let config = HttpConfig {
            proxy: Some(ProxyConfig::new("http://localhost:8080").with_credentials("u", "p")),
            ..Default::default()
        };
        assert!(ReqwestTransport::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_from_bytes_yields_single_chunk() {
        let response = TransportResponse::from_bytes(StatusCode::OK, HeaderMap::new(), "hello");
        let chunks: Vec<_> = response.body.collect().await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap(), &Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let transport = ReqwestTransport::new(&HttpConfig::default()).unwrap();
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let request = TransportRequest {
            method: Method::GET,
            url: Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap(),
            headers: HeaderMap::new(),
            body: String::new(),
        };
        let err = transport.perform(request).await.unwrap_err();
        assert!(err.is_network());
    }
}
