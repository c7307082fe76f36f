//! Outbound HTTPS dispatch.
//!
//! # Responsibilities
//! - Send the sanitized request to the validated target
//! - Enforce the request timeout on connect, send and body read
//! - Translate transport errors into timeout / TLS / transport / internal
//!
//! # Design Decisions
//! - Redirects are never followed; the 3xx goes back to the caller
//! - Certificate verification is always on and cannot be disabled per request
//! - No retries; a failure is reported once
//! - `reqwest` error types never leave this module

use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

/// A fully prepared request for the upstream endpoint.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// What the upstream answered, before header sanitization.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Classified dispatch failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Request timeout")]
    Timeout,

    #[error("SSL certificate verification failed: {0}")]
    Tls(String),

    #[error("Failed to relay request: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::Timeout => "timeout",
            DispatchError::Tls(_) => "ssl_error",
            DispatchError::Transport(_) => "request_failed",
            DispatchError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            DispatchError::Tls(_) | DispatchError::Transport(_) => StatusCode::BAD_GATEWAY,
            DispatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Something that can carry a request to an upstream endpoint.
pub trait Upstream: Send + Sync + 'static {
    fn send(
        &self,
        request: OutboundRequest,
    ) -> impl Future<Output = Result<UpstreamResponse, DispatchError>> + Send;
}

/// Production upstream backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpsUpstream {
    client: reqwest::Client,
}

impl HttpsUpstream {
    /// Build a client with the given total request timeout.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .https_only(true)
            .build()?;
        Ok(Self { client })
    }
}

impl Upstream for HttpsUpstream {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, DispatchError> {
        let response = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?;

        Ok(UpstreamResponse { status, headers, body })
    }
}

/// Map a `reqwest` error onto the relay's failure causes.
fn classify(err: reqwest::Error) -> DispatchError {
    if err.is_timeout() {
        DispatchError::Timeout
    } else if is_tls_failure(&err) {
        DispatchError::Tls(error_chain(&err))
    } else if err.is_builder() {
        DispatchError::Internal(error_chain(&err))
    } else {
        DispatchError::Transport(error_chain(&err))
    }
}

/// Walks the source chain looking for a rustls error, which tokio-rustls
/// hands back wrapped inside one or more `io::Error` layers.
pub(crate) fn is_tls_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<rustls::Error>() {
            return true;
        }
        current = match e.downcast_ref::<std::io::Error>() {
            // `io::Error::source` skips over an `io::Error` wrapped directly inside it.
            Some(io) => io.get_ref().map(|inner| inner as &(dyn StdError + 'static)),
            None => e.source(),
        };
    }
    false
}

/// `outer: inner: innermost` rendering for logs and 502 bodies.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        let msg = e.to_string();
        if !parts.iter().any(|p| p.contains(&msg)) {
            parts.push(msg);
        }
        current = e.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug)]
    struct Wrapper(Box<dyn StdError + Send + Sync>);

    impl std::fmt::Display for Wrapper {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "client error (Connect)")
        }
    }

    impl StdError for Wrapper {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&*self.0)
        }
    }

    #[test]
    fn test_codes_and_statuses() {
        assert_eq!(DispatchError::Timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(DispatchError::Timeout.code(), "timeout");
        assert_eq!(DispatchError::Tls("x".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(DispatchError::Tls("x".into()).code(), "ssl_error");
        assert_eq!(DispatchError::Transport("x".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(DispatchError::Transport("x".into()).code(), "request_failed");
        assert_eq!(DispatchError::Internal("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(DispatchError::Internal("x".into()).code(), "internal_error");
    }

    #[test]
    fn test_rustls_error_inside_io_error_is_tls() {
        let tls = rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer);
        let err = Wrapper(Box::new(io::Error::new(io::ErrorKind::InvalidData, tls)));
        assert!(is_tls_failure(&err));
    }

    #[test]
    fn test_rustls_error_nested_in_two_io_errors_is_tls() {
        let tls = rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer);
        let inner = io::Error::new(io::ErrorKind::InvalidData, tls);
        let err = Wrapper(Box::new(io::Error::other(inner)));
        assert!(is_tls_failure(&err));
    }

    #[test]
    fn test_nested_plain_io_error_is_not_tls() {
        let inner = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        let err = Wrapper(Box::new(io::Error::other(inner)));
        assert!(!is_tls_failure(&err));
    }

    #[test]
    fn test_plain_io_error_is_not_tls() {
        let err = Wrapper(Box::new(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused")));
        assert!(!is_tls_failure(&err));
    }

    #[test]
    fn test_error_chain_skips_repeats() {
        let err = Wrapper(Box::new(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused")));
        assert_eq!(error_chain(&err), "client error (Connect): connection refused");
    }

    #[tokio::test]
    async fn test_plain_http_is_refused_by_client() {
        let upstream = HttpsUpstream::new(Duration::from_secs(1)).unwrap();
        let err = upstream
            .send(OutboundRequest {
                method: Method::GET,
                url: Url::parse("http://127.0.0.1:1/").unwrap(),
                headers: HeaderMap::new(),
                body: Bytes::new(),
            })
            .await
            .unwrap_err();
        // https_only rejects before any connection is attempted
        assert_eq!(err.code(), "internal_error");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport() {
        let upstream = HttpsUpstream::new(Duration::from_secs(5)).unwrap();
        let err = upstream
            .send(OutboundRequest {
                method: Method::GET,
                url: Url::parse("https://127.0.0.1:1/").unwrap(),
                headers: HeaderMap::new(),
                body: Bytes::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "request_failed");
    }
}
