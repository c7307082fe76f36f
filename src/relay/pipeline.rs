//! Relay pipeline: validate, sanitize, dispatch, map.
//!
//! Validation and dispatch happen inside one `relay` call; a target is
//! never reused across requests.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::http::header::InvalidHeaderName;
use futures_util::FutureExt;

use crate::config::RelaySettings;
use crate::observability::metrics;
use crate::relay::dispatch::{DispatchError, HttpsUpstream, OutboundRequest, Upstream};
use crate::relay::error::RelayError;
use crate::relay::headers::{sanitize_request_headers, sanitize_response_headers};
use crate::relay::target::{validate, TargetSpec, ValidationError};
use crate::routing::AllowList;

/// An inbound request as the pipeline sees it.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Raw inbound query string, without the leading `?`.
    pub query: Option<String>,
}

/// Upstream answer ready for the caller.
#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    /// Already sanitized.
    pub headers: HeaderMap,
    pub body: Bytes,
    pub content_type: Option<HeaderValue>,
}

/// Either the forwarded response or the classified failure.
pub type RelayOutcome = Result<ForwardedResponse, RelayError>;

/// The request-validation and forwarding pipeline.
///
/// Holds only immutable configuration plus the upstream client, so one
/// instance is shared by all concurrent requests.
#[derive(Debug)]
pub struct RelayPipeline<U = HttpsUpstream> {
    allowlist: AllowList,
    target_header: HeaderName,
    upstream: U,
}

impl RelayPipeline<HttpsUpstream> {
    /// Pipeline backed by the real HTTPS client.
    pub fn from_settings(settings: &RelaySettings) -> Result<Self, PipelineError> {
        let upstream = HttpsUpstream::new(settings.request_timeout()).map_err(PipelineError::Client)?;
        Self::with_upstream(settings, upstream)
    }
}

impl<U: Upstream> RelayPipeline<U> {
    pub fn new(allowlist: AllowList, target_header: HeaderName, upstream: U) -> Self {
        Self {
            allowlist,
            target_header,
            upstream,
        }
    }

    pub fn with_upstream(settings: &RelaySettings, upstream: U) -> Result<Self, PipelineError> {
        let target_header = HeaderName::from_bytes(settings.target_header.as_bytes())?;
        Ok(Self::new(
            AllowList::new(&settings.allowed_domains),
            target_header,
            upstream,
        ))
    }

    pub fn allowlist(&self) -> &AllowList {
        &self.allowlist
    }

    pub fn target_header(&self) -> &HeaderName {
        &self.target_header
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    /// Validate the target carried by `request` against the allow-list.
    pub fn validate(&self, request: &RelayRequest) -> Result<TargetSpec, ValidationError> {
        let directive = match request.headers.get(&self.target_header) {
            None => None,
            Some(value) => Some(value.to_str().map_err(|_| {
                ValidationError::InvalidUrl("target header is not valid ASCII".to_string())
            })?),
        };
        validate(directive, &self.allowlist)
    }

    /// Run one request through the pipeline.
    pub async fn relay(&self, request: RelayRequest) -> RelayOutcome {
        let start = Instant::now();
        let method = request.method.clone();

        let target = match self.validate(&request) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(reason = %e, code = e.code(), "Request rejected");
                metrics::record_rejection(e.code());
                return Err(e.into());
            }
        };

        tracing::info!(method = %method, url = %target.raw(), "Relaying request");

        let outbound = OutboundRequest {
            method: request.method,
            url: target.url_with_query(request.query.as_deref()),
            headers: sanitize_request_headers(&request.headers, &self.target_header),
            body: request.body,
        };

        let result = AssertUnwindSafe(self.upstream.send(outbound))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(DispatchError::Internal(panic_message(&*panic))));

        match result {
            Ok(response) => {
                tracing::info!(
                    method = %method,
                    url = %target.raw(),
                    status = response.status.as_u16(),
                    "Successfully relayed"
                );
                metrics::record_request(method.as_str(), response.status.as_u16(), start);

                let content_type = response.headers.get(header::CONTENT_TYPE).cloned();
                Ok(ForwardedResponse {
                    status: response.status,
                    headers: sanitize_response_headers(&response.headers),
                    body: response.body,
                    content_type,
                })
            }
            Err(e) => {
                match &e {
                    DispatchError::Internal(detail) => {
                        tracing::error!(url = %target.raw(), detail = %detail, "Unexpected error relaying request");
                    }
                    other => {
                        tracing::error!(url = %target.raw(), error = %other, "Relay failed");
                    }
                }
                metrics::record_upstream_failure(e.code());
                metrics::record_request(method.as_str(), e.status().as_u16(), start);
                Err(e.into())
            }
        }
    }
}

/// Errors constructing a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid target header: {0}")]
    TargetHeader(#[from] InvalidHeaderName),

    #[error("failed to build HTTPS client: {0}")]
    Client(reqwest::Error),
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic during dispatch".to_string()
    }
}
