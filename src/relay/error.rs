//! Outward relay error.

use axum::http::StatusCode;
use thiserror::Error;

use crate::relay::dispatch::DispatchError;
use crate::relay::target::ValidationError;

/// Any failure the caller sees from the relay endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Client input problem; never dispatched.
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    /// The dispatch itself failed.
    #[error(transparent)]
    Upstream(#[from] DispatchError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Rejected(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream(e) => e.status(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Rejected(e) => e.code(),
            RelayError::Upstream(e) => e.code(),
        }
    }

    /// Message safe to return to the caller. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            RelayError::Upstream(DispatchError::Tls(_)) => "SSL certificate verification failed".to_string(),
            RelayError::Upstream(DispatchError::Internal(_)) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}
