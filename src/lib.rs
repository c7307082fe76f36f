//! HTTP to HTTPS relay library.
//!
//! Accepts plaintext requests, checks the `X-Target-URL` directive against
//! a domain allow-list and forwards the request over verified HTTPS.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod routing;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{RelayPipeline, RelayRequest};
