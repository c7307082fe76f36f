//! Domain allow-list matching.
//!
//! # Responsibilities
//! - Match a target host against shell-glob patterns (`*`, `?`, `[seq]`, `[!seq]`)
//! - Compare case-insensitively (hostnames are case-insensitive)
//! - Fail closed: no patterns means no host is allowed
//!
//! # Design Decisions
//! - Whole-string match only, never substring
//! - No DNS: purely structural check on the literal host
//! - Patterns compiled once at construction; a pattern that fails to compile
//!   matches nothing

use globset::{GlobBuilder, GlobMatcher};

/// An immutable, ordered set of compiled glob patterns.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    /// Lowercased source patterns, in configuration order.
    patterns: Vec<String>,
    matchers: Vec<GlobMatcher>,
}

impl AllowList {
    /// Build an allow-list, normalizing every pattern to lowercase.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_lowercase())
            .collect();

        let matchers = patterns
            .iter()
            .filter_map(|p| match compile_pattern(p) {
                Ok(m) => Some(m),
                Err(e) => {
                    tracing::warn!(pattern = %p, error = %e, "Ignoring invalid domain pattern");
                    None
                }
            })
            .collect();

        Self { patterns, matchers }
    }

    /// Returns true if `host` matches any configured pattern.
    pub fn allows(&self, host: &str) -> bool {
        if self.patterns.is_empty() {
            tracing::warn!("No allowed domains configured - blocking all requests");
            return false;
        }
        self.matchers.iter().any(|m| m.is_match(host))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Returns true if `host` matches any of `patterns`, ignoring case.
pub fn matches<S: AsRef<str>>(host: &str, patterns: &[S]) -> bool {
    AllowList::new(patterns).allows(host)
}

/// Compile one allow-list pattern.
///
/// `*` and `?` cross `.` freely and backslash is an ordinary character, as
/// in shell `fnmatch`.
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(pattern)
        .case_insensitive(true)
        .literal_separator(false)
        .backslash_escape(false)
        .build()?
        .compile_matcher())
}
