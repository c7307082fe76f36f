//! End-to-end tests against a running relay using the real HTTPS client.

use std::time::Duration;

use axum::http::StatusCode;
use https_relay::http::ErrorBody;
use serde_json::Value;

mod common;

async fn error_of(res: reqwest::Response) -> ErrorBody {
    res.json().await.expect("error body should be JSON")
}

#[tokio::test]
async fn test_missing_target_header() {
    let (addr, shutdown) = common::spawn_relay(common::config(&["api.example.com"])).await;

    let res = common::client()
        .get(format!("http://{addr}/relay"))
        .send()
        .await
        .expect("Relay unreachable");

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = error_of(res).await;
    assert_eq!(body.code, "missing_target");
    assert_eq!(body.error, "Missing target URL");

    shutdown.trigger();
}

#[tokio::test]
async fn test_http_target_rejected() {
    let (addr, shutdown) = common::spawn_relay(common::config(&["*.example.com"])).await;

    let res = common::client()
        .post(format!("http://{addr}/relay"))
        .header("X-Target-URL", "http://x.example.com/submit")
        .body("payload")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = error_of(res).await;
    assert_eq!(body.code, "https_required");
    assert_eq!(body.error, "Target URL must use HTTPS protocol, got: http");

    shutdown.trigger();
}

#[tokio::test]
async fn test_domain_not_allowed() {
    let (addr, shutdown) = common::spawn_relay(common::config(&["*.example.com"])).await;

    let res = common::client()
        .get(format!("http://{addr}/relay"))
        .header("X-Target-URL", "https://evil.com/")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = error_of(res).await;
    assert_eq!(body.code, "domain_not_allowed");
    assert_eq!(body.error, "Domain not allowed: evil.com");

    shutdown.trigger();
}

#[tokio::test]
async fn test_empty_allow_list_blocks_everything() {
    let (addr, shutdown) = common::spawn_relay(common::config(&[])).await;

    let res = common::client()
        .get(format!("http://{addr}/relay"))
        .header("X-Target-URL", "https://api.example.com/")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(res).await.code, "domain_not_allowed");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unsupported_method() {
    let (addr, shutdown) = common::spawn_relay(common::config(&["*"])).await;

    let res = common::client()
        .request(reqwest::Method::TRACE, format!("http://{addr}/relay"))
        .header("X-Target-URL", "https://api.example.com/")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    shutdown.trigger();
}

#[tokio::test]
async fn test_health_endpoint() {
    let (addr, shutdown) = common::spawn_relay(common::config(&["api.example.com", "*.github.com"])).await;

    let res = common::client()
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "http-to-https-relay");
    assert!(json["timestamp"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(json["allowed_domains"], serde_json::json!(["api.example.com", "*.github.com"]));

    shutdown.trigger();
}

#[tokio::test]
async fn test_info_endpoint() {
    let (addr, shutdown) = common::spawn_relay(common::config(&[])).await;

    let json: Value = common::client()
        .get(format!("http://{addr}/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["service"], "HTTP to HTTPS Relay Server");
    assert_eq!(json["usage"]["endpoint"], "/relay");
    assert_eq!(json["usage"]["header"], "X-Target-URL");
    assert_eq!(json["usage"]["methods"].as_array().unwrap().len(), 7);
    assert_eq!(json["health_check"], "/health");
    assert_eq!(json["allowed_domains"], serde_json::json!(["None configured"]));

    shutdown.trigger();
}

#[tokio::test]
async fn test_connection_refused_is_bad_gateway() {
    let port = common::closed_port().await;
    let (addr, shutdown) = common::spawn_relay(common::config(&["127.0.0.1"])).await;

    let res = common::client()
        .get(format!("http://{addr}/relay"))
        .header("X-Target-URL", format!("https://127.0.0.1:{port}/"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body = error_of(res).await;
    assert_eq!(body.code, "request_failed");
    assert!(body.error.starts_with("Failed to relay request"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_timeout_is_gateway_timeout() {
    let backend = common::start_silent_backend().await;
    let (addr, shutdown) = common::spawn_relay(common::config(&["127.0.0.1"])).await;

    let started = std::time::Instant::now();
    let res = common::client()
        .get(format!("http://{addr}/relay"))
        .header("X-Target-URL", format!("https://{backend}/slow"))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(started.elapsed() < Duration::from_secs(5), "relay timeout should apply");
    let body = error_of(res).await;
    assert_eq!(body.code, "timeout");
    assert_eq!(body.error, "Request timeout");

    shutdown.trigger();
}

#[tokio::test]
async fn test_untrusted_certificate_is_ssl_error() {
    let backend = common::start_self_signed_backend().await;
    let (addr, shutdown) = common::spawn_relay(common::config(&["127.0.0.1"])).await;

    let res = common::client()
        .get(format!("http://{addr}/relay"))
        .header("X-Target-URL", format!("https://{backend}/"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body = error_of(res).await;
    assert_eq!(body.code, "ssl_error");
    assert_eq!(body.error, "SSL certificate verification failed");

    shutdown.trigger();
}

#[tokio::test]
async fn test_plaintext_peer_is_ssl_error() {
    let backend = common::start_plaintext_backend().await;
    let (addr, shutdown) = common::spawn_relay(common::config(&["127.0.0.1"])).await;

    let res = common::client()
        .get(format!("http://{addr}/relay"))
        .header("X-Target-URL", format!("https://{backend}/"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body = error_of(res).await;
    assert_eq!(body.code, "ssl_error");
    assert_eq!(body.error, "SSL certificate verification failed");

    shutdown.trigger();
}

#[tokio::test]
async fn test_body_over_limit_rejected() {
    let mut config = common::config(&["*"]);
    config.relay.max_body_size = 16;
    let (addr, shutdown) = common::spawn_relay(config).await;

    let res = common::client()
        .post(format!("http://{addr}/relay"))
        .header("X-Target-URL", "https://api.example.com/")
        .body(vec![b'x'; 64])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    shutdown.trigger();
}
