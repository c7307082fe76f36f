//! Hop-by-hop header stripping.
//!
//! # Responsibilities
//! - Strip connection-management headers in both directions
//! - Never forward the target directive header upstream
//! - Drop framing headers from upstream responses (the body is re-framed)
//!
//! # Design Decisions
//! - Exclusion lists are static lowercase sets, checked by membership
//! - Every non-excluded entry is kept, including repeated names

use std::collections::HashSet;
use std::sync::LazyLock;

use axum::http::{HeaderMap, HeaderName};

/// Headers that only describe the current transport hop.
pub static HOP_BY_HOP: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "host",
        "connection",
        "keep-alive",
        "proxy-authenticate",
        "proxy-authorization",
        "te",
        "trailers",
        "transfer-encoding",
        "upgrade",
    ])
});

/// Extra headers dropped from upstream responses; the relay forwards the
/// decoded body, so the upstream's encoding and length no longer apply.
pub static RESPONSE_FRAMING: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| HashSet::from(["content-encoding", "content-length"]));

/// Returns true if `name` (any case) is a hop-by-hop header.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.contains(name.to_ascii_lowercase().as_str())
}

/// Headers to send upstream: inbound headers minus hop-by-hop and the
/// target directive header.
pub fn sanitize_request_headers(inbound: &HeaderMap, target_header: &HeaderName) -> HeaderMap {
    filter(inbound, |name| {
        HOP_BY_HOP.contains(name.as_str()) || name == target_header
    })
}

/// Headers to return to the caller: upstream headers minus hop-by-hop and
/// body framing.
pub fn sanitize_response_headers(upstream: &HeaderMap) -> HeaderMap {
    filter(upstream, |name| {
        HOP_BY_HOP.contains(name.as_str()) || RESPONSE_FRAMING.contains(name.as_str())
    })
}

// HeaderName is always lowercase, so set lookups need no further folding.
fn filter(headers: &HeaderMap, excluded: impl Fn(&HeaderName) -> bool) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !excluded(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}
