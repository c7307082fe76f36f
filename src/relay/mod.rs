//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (method, headers, body, query)
//!     → target.rs (parse X-Target-URL, require https, allow-list check)
//!     → headers.rs (strip hop-by-hop + directive header)
//!     → dispatch.rs (HTTPS call, timeout, no redirects)
//!     → headers.rs (strip hop-by-hop + framing from the answer)
//!     → ForwardedResponse | RelayError
//! ```
//!
//! # Design Decisions
//! - Pipeline holds only immutable state; safe to share across tasks
//! - Rejected targets never reach dispatch
//! - Upstream 4xx/5xx are answers, not relay failures
//! - Transport errors are classified here and never leak out

pub mod dispatch;
pub mod error;
pub mod headers;
pub mod pipeline;
pub mod target;

pub use dispatch::{DispatchError, HttpsUpstream, OutboundRequest, Upstream, UpstreamResponse};
pub use error::RelayError;
pub use pipeline::{ForwardedResponse, PipelineError, RelayOutcome, RelayPipeline, RelayRequest};
pub use target::{validate, TargetSpec, ValidationError};
