//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay pipeline and HTTP layer produce:
//!     → logging.rs (structured log events: rejections, relays, failures)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout and optional log file
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than formatted strings
//! - Request ID (x-request-id) attached to every request span
//! - Logging never fails a request

pub mod logging;
pub mod metrics;
