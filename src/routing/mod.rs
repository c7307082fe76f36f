//! Target admission.
//!
//! # Data Flow
//! ```text
//! Validated target host
//!     → matcher.rs (glob match against allow-list)
//!     → allowed / rejected
//!
//! Allow-list compilation (at startup):
//!     RelaySettings.allowed_domains
//!     → lowercase
//!     → compile each pattern (globset, case-insensitive)
//!     → freeze as immutable AllowList
//! ```
//!
//! # Design Decisions
//! - Allow-list compiled at startup, immutable at runtime
//! - Patterns compiled once, never per request
//! - Fail closed on empty configuration

pub mod matcher;

pub use matcher::{compile_pattern, matches, AllowList};
