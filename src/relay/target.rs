//! Target URL validation.
//!
//! # Responsibilities
//! - Parse the target directive as an absolute URL
//! - Require the `https` scheme and a non-empty host
//! - Check the port-stripped host against the allow-list
//!
//! # Design Decisions
//! - Every failure is a distinct variant so callers can diagnose it
//! - Validation result is never cached; each request validates afresh

use thiserror::Error;
use url::{ParseError, Url};

use crate::routing::AllowList;

/// A validated relay target. Only constructed by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    url: Url,
    host: String,
    raw: String,
}

impl TargetSpec {
    /// Always `https`.
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host without port, as checked against the allow-list.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, if the directive carried a non-default one.
    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    /// The directive exactly as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Target URL with the inbound query string appended.
    ///
    /// The raw query is kept as-is; an existing target query is joined with `&`.
    pub fn url_with_query(&self, query: Option<&str>) -> Url {
        let mut url = self.url.clone();
        if let Some(extra) = query.filter(|q| !q.is_empty()) {
            let joined = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{extra}"),
                _ => extra.to_string(),
            };
            url.set_query(Some(&joined));
        }
        url
    }
}

/// Why a target directive was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing target URL")]
    MissingTarget,

    #[error("Invalid target URL: {0}")]
    InvalidUrl(String),

    #[error("Target URL must use HTTPS protocol, got: {0}")]
    NotHttps(String),

    #[error("Invalid target URL: missing domain")]
    MissingDomain,

    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),
}

impl ValidationError {
    /// Machine-readable code reported to the caller.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingTarget => "missing_target",
            ValidationError::InvalidUrl(_) => "invalid_url",
            ValidationError::NotHttps(_) => "https_required",
            ValidationError::MissingDomain => "missing_domain",
            ValidationError::DomainNotAllowed(_) => "domain_not_allowed",
        }
    }
}

/// Validate a target directive against the allow-list.
pub fn validate(directive: Option<&str>, allowlist: &AllowList) -> Result<TargetSpec, ValidationError> {
    let raw = match directive.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(ValidationError::MissingTarget),
    };

    let url = match Url::parse(raw) {
        Ok(url) => url,
        // A scheme-less directive ("example.com/path") has no scheme at all.
        Err(ParseError::RelativeUrlWithoutBase) => {
            return Err(ValidationError::NotHttps(String::new()));
        }
        Err(ParseError::EmptyHost) => {
            let scheme = scheme_of(raw);
            return Err(if scheme == "https" {
                ValidationError::MissingDomain
            } else {
                ValidationError::NotHttps(scheme)
            });
        }
        Err(e) => return Err(ValidationError::InvalidUrl(e.to_string())),
    };

    if url.scheme() != "https" {
        return Err(ValidationError::NotHttps(url.scheme().to_string()));
    }

    // host_str() excludes any `:port` suffix and userinfo.
    let host = match url.host_str() {
        Some(host) if !host.is_empty() => strip_port(host).to_string(),
        _ => return Err(ValidationError::MissingDomain),
    };

    if !allowlist.allows(&host) {
        return Err(ValidationError::DomainNotAllowed(host));
    }

    Ok(TargetSpec {
        url,
        host,
        raw: raw.to_string(),
    })
}

/// Drop a trailing `:port` from a host, leaving bracketed IPv6 literals intact.
pub fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

fn scheme_of(raw: &str) -> String {
    raw.split_once(':')
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
        .unwrap_or_default()
}
