//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn a forwarded upstream answer into the client response
//! - Render relay failures as structured JSON errors
//!
//! # Design Decisions
//! - Upstream status and body are returned verbatim
//! - Error bodies carry a human message plus a machine code
//! - Internal fault details never reach the body

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::relay::{ForwardedResponse, RelayError};

/// JSON body of every relay error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl From<&RelayError> for ErrorBody {
    fn from(err: &RelayError) -> Self {
        Self {
            error: err.public_message(),
            code: err.code().to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}

impl IntoResponse for ForwardedResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.headers, self.body).into_response();
        // Bytes bodies default to application/octet-stream; mirror upstream instead.
        match self.content_type {
            Some(content_type) => {
                response.headers_mut().insert(header::CONTENT_TYPE, content_type);
            }
            None => {
                response.headers_mut().remove(header::CONTENT_TYPE);
            }
        }
        response
    }
}
