//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, body limit)
//!     → handlers.rs (/relay, /health, /)
//!     → relay pipeline (validate, sanitize, dispatch)
//!     → response.rs (forwarded answer or JSON error)
//!     → Send to client
//! ```

pub mod handlers;
pub mod response;
pub mod server;

pub use response::ErrorBody;
pub use server::{build_router, AppState, HttpServer, ServerError};
