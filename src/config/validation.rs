//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeout > 0, port valid, body limit > 0)
//! - Check the target header can be carried and is not stripped in transit
//! - Check every allow-list pattern compiles
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::relay::headers::is_hop_by_hop;
use crate::routing::compile_pattern;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.port must be greater than 0")]
    ZeroPort,

    #[error("relay.request_timeout_secs must be greater than 0")]
    ZeroTimeout,

    #[error("relay.max_body_size must be greater than 0")]
    ZeroBodyLimit,

    #[error("relay.target_header {0:?} is not a valid header name")]
    InvalidTargetHeader(String),

    #[error("relay.target_header {0:?} is a hop-by-hop header")]
    HopByHopTargetHeader(String),

    #[error("relay.allowed_domains contains an empty pattern")]
    EmptyPattern,

    #[error("relay.allowed_domains pattern {pattern:?} is invalid: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    let relay = &config.relay;
    if relay.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if relay.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    match HeaderName::from_bytes(relay.target_header.as_bytes()) {
        Ok(name) if is_hop_by_hop(name.as_str()) => {
            errors.push(ValidationError::HopByHopTargetHeader(relay.target_header.clone()));
        }
        Ok(_) => {}
        Err(_) => errors.push(ValidationError::InvalidTargetHeader(relay.target_header.clone())),
    }
    if relay.allowed_domains.iter().any(|p| p.trim().is_empty()) {
        errors.push(ValidationError::EmptyPattern);
    }
    for pattern in &relay.allowed_domains {
        if let Err(e) = compile_pattern(pattern) {
            errors.push(ValidationError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.kind().to_string(),
            });
        }
    }

    let obs = &config.observability;
    if !LOG_LEVELS.contains(&obs.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel(obs.log_level.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
