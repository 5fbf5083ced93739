//! End-to-end tests of the request pipeline against an in-process HTTP server.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use vantuz_core::logging::{LogConfig, try_init_logging};
use vantuz_core::prelude::*;
use vantuz_core::{ReqwestTransport, TargetBand, Transport, TransportRequest, TransportResponse};
use wiremock::matchers::{any, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Grant {
    grant_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Item {
    id: u32,
}

/// Records when each exchange actually starts, then delegates.
#[derive(Debug)]
struct TimingTransport {
    inner: ReqwestTransport,
    starts: Mutex<Vec<Instant>>,
}

#[async_trait]
impl Transport for TimingTransport {
    async fn perform(&self, request: TransportRequest) -> vantuz_core::Result<TransportResponse> {
        self.starts.lock().unwrap().push(Instant::now());
        self.inner.perform(request).await
    }
}

fn client() -> Client {
    let _ = try_init_logging(&LogConfig::test());
    let mut client = Client::new().expect("Failed to create client");
    client.set_logger(TracingLogger);
    client
}

#[tokio::test]
async fn test_rate_limited_gets_are_spaced() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .expect(10)
        .mount(&mock_server)
        .await;

    let timing = Arc::new(TimingTransport {
        inner: ReqwestTransport::new(&HttpConfig::default()).expect("Failed to build transport"),
        starts: Mutex::new(Vec::new()),
    });
    let transport: Arc<dyn Transport> = timing.clone();
    let mut client = client();
    client.set_transport(Some(transport));
    client.set_rate_limit(5, Duration::from_secs(1));

    let url = format!("{}/ping", mock_server.uri());
    let cancel = CancellationToken::new();
    let started = Instant::now();
    for _ in 0..10 {
        client.new_request().get(&cancel, &url).await.unwrap();
    }
    let elapsed = started.elapsed();

    assert_eq!(mock_server.received_requests().await.unwrap().len(), 10);
    assert!(elapsed >= Duration::from_millis(1700), "elapsed {elapsed:?}");

    let starts = timing.starts.lock().unwrap();
    assert_eq!(starts.len(), 10);
    for window in starts.windows(6) {
        let span = window[5].duration_since(window[0]);
        assert!(span >= Duration::from_millis(950), "six starts within {span:?}");
    }
}

#[tokio::test]
async fn test_form_post_repeated_sends() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("grant_type=device_code"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"grant_type":"device_code"}"#, "application/json"),
        )
        .expect(10)
        .mount(&mock_server)
        .await;

    let client = client();
    let grant = JsonTarget::<Grant>::new();
    let request = client
        .new_request()
        .set_form_url_map([("grant_type", "device_code")])
        .set_result(Some(grant.clone()));
    let url = format!("{}/token", mock_server.uri());
    let cancel = CancellationToken::new();

    for _ in 0..10 {
        let response = request.post(&cancel, &url).await.unwrap();
        assert!(response.is_success());
        assert_eq!(grant.take().unwrap().grant_type, "device_code");
    }

    for received in mock_server.received_requests().await.unwrap() {
        let form: Vec<(String, String)> = url::form_urlencoded::parse(&received.body)
            .into_owned()
            .collect();
        assert_eq!(form, [("grant_type".to_string(), "device_code".to_string())]);
    }
}

#[tokio::test]
async fn test_malformed_url_reaches_no_server() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client();
    let url = format!("{}/items\u{1}/1", mock_server.uri());
    let err = client
        .new_request()
        .get(&CancellationToken::new(), &url)
        .await
        .unwrap_err();

    assert!(err.is_invalid_url());
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_not_found_populates_error_target() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_raw(r#"{"message":"not found"}"#, "application/json"),
        )
        .mount(&mock_server)
        .await;

    let client = client();
    let err_target = JsonTarget::<ApiError>::new();
    let response = client
        .new_request()
        .set_error(Some(err_target.clone()))
        .get(
            &CancellationToken::new(),
            &format!("{}/items/404", mock_server.uri()),
        )
        .await
        .unwrap();

    assert!(response.is_error());
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(err_target.get().unwrap().message, "not found");
    let returned = response.error::<ApiError>().unwrap();
    assert!(returned.ptr_eq(&err_target));
    assert_eq!(returned.get().unwrap().message, "not found");
}

#[tokio::test]
async fn test_non_json_success_body_is_decode_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client();
    let cancel = CancellationToken::new();

    let err = client
        .new_request()
        .set_result(Some(JsonTarget::<Item>::new()))
        .get(&cancel, &format!("{}/html", mock_server.uri()))
        .await
        .unwrap_err();
    let decode = err.as_decode().expect("decode error");
    assert_eq!(decode.band, TargetBand::Success);
    assert_eq!(decode.body, "<html>maintenance</html>");
    assert!(err.to_string().starts_with("unmarshal response:"));

    let item = JsonTarget::<Item>::new();
    let response = client
        .new_request()
        .set_result(Some(item.clone()))
        .get(&cancel, &format!("{}/empty", mock_server.uri()))
        .await
        .unwrap();
    assert!(response.is_success());
    assert!(!item.is_populated());
}

#[tokio::test]
async fn test_non_json_error_body_is_decode_error() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let client = client();
    let err = client
        .new_request()
        .set_error(Some(JsonTarget::<ApiError>::new()))
        .delete(&CancellationToken::new(), &mock_server.uri())
        .await
        .unwrap_err();

    let decode = err.as_decode().expect("decode error");
    assert_eq!(decode.band, TargetBand::Error);
    assert_eq!(decode.status, 502);
    assert!(err.to_string().starts_with("unmarshal response error:"));
}

#[tokio::test]
async fn test_defaults_and_overrides_on_the_wire() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("x-tenant", "override"))
        .and(query_param("api_key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_string("override"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(header("x-tenant", "acme"))
        .and(query_param("api_key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_string("default"))
        .mount(&mock_server)
        .await;

    let mut client = client();
    client
        .set_global_header("X-Tenant", "acme")
        .set_user_agent("vantuz-tests")
        .set_global_query_params([("api_key", "k")].into_iter().collect());
    let url = format!("{}/items?stale=1", mock_server.uri());
    let cancel = CancellationToken::new();

    let first = client
        .new_request()
        .set_header("X-Tenant", "override")
        .get(&cancel, &url)
        .await
        .unwrap();
    let second = client.new_request().get(&cancel, &url).await.unwrap();

    assert_eq!(first.text(), "override");
    assert_eq!(second.text(), "default");

    for received in mock_server.received_requests().await.unwrap() {
        assert_eq!(received.url.query(), Some("api_key=k"));
        assert_eq!(received.headers["user-agent"], "vantuz-tests");
        assert_eq!(received.headers["content-type"], "application/json");
    }
}

#[tokio::test]
async fn test_json_string_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(header("content-type", "application/json"))
        .and(body_string(r#"{"id":3}"#))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"id":3}"#, "application/json"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client();
    let response = client
        .new_request()
        .set_json_string(r#"{"id":3}"#)
        .put(&CancellationToken::new(), &mock_server.uri())
        .await
        .unwrap();

    assert_eq!(response.json::<Item>().unwrap(), Item { id: 3 });
}

#[tokio::test]
async fn test_cancel_while_server_is_slow() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let client = client();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client
        .new_request()
        .get(&cancel, &mock_server.uri())
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_transport_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let config = HttpConfig {
        timeout: Duration::from_secs(1),
        ..Default::default()
    };
    let client = Client::with_config(config).unwrap();
    let err = client
        .new_request()
        .get(&CancellationToken::new(), &mock_server.uri())
        .await
        .unwrap_err();

    assert!(err.is_network());
    assert!(err.is_timeout(), "{}", err.report());
}
