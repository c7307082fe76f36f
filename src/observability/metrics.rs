//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relayed requests by method, status
//! - `relay_request_duration_seconds` (histogram): end-to-end relay latency
//! - `relay_rejections_total` (counter): refused targets by error code
//! - `relay_upstream_failures_total` (counter): dispatch failures by error code
//!
//! Recording is a no-op until a recorder is installed, so unit tests and
//! deployments without metrics pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("relay_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(code: &'static str) {
    ::metrics::counter!("relay_rejections_total", "code" => code).increment(1);
}

pub fn record_upstream_failure(code: &'static str) {
    ::metrics::counter!("relay_upstream_failures_total", "code" => code).increment(1);
}
