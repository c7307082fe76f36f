//! Request handlers.
//!
//! # Responsibilities
//! - `/relay`: hand the inbound request to the relay pipeline and render the outcome
//! - `/health`: liveness plus the configured allow-list
//! - `/`: usage information for callers
//!
//! # Design Decisions
//! - Handlers hold no logic of their own beyond extraction and rendering
//! - Generic over the upstream so tests can swap the HTTPS client out

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::http::server::AppState;
use crate::relay::{RelayRequest, Upstream};

pub const SERVICE_ID: &str = "http-to-https-relay";
pub const SERVICE_NAME: &str = "HTTP to HTTPS Relay Server";
pub const RELAY_PATH: &str = "/relay";
pub const HEALTH_PATH: &str = "/health";
pub const RELAY_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
    pub allowed_domains: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Usage {
    pub endpoint: &'static str,
    pub methods: [&'static str; 7],
    pub header: String,
    pub example: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub usage: Usage,
    pub health_check: &'static str,
    pub allowed_domains: Vec<String>,
}

/// Relay endpoint: everything interesting happens in the pipeline.
pub async fn relay<U: Upstream>(
    State(state): State<AppState<U>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = RelayRequest {
        method,
        headers,
        body,
        query: uri.query().map(String::from),
    };

    match state.pipeline.relay(request).await {
        Ok(forwarded) => forwarded.into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn health<U: Upstream>(State(state): State<AppState<U>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        service: SERVICE_ID,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        allowed_domains: state.pipeline.allowlist().patterns().to_vec(),
    })
}

pub async fn info<U: Upstream>(State(state): State<AppState<U>>) -> Json<ServiceInfo> {
    let header = state.display_header.clone();
    let allowed = state.pipeline.allowlist().patterns();

    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        usage: Usage {
            endpoint: RELAY_PATH,
            methods: RELAY_METHODS,
            example: format!(
                "curl -H \"{header}: https://api.example.com/data\" http://localhost:{}{RELAY_PATH}",
                state.port
            ),
            header,
        },
        health_check: HEALTH_PATH,
        allowed_domains: if allowed.is_empty() {
            vec!["None configured".to_string()]
        } else {
            allowed.to_vec()
        },
    })
}
