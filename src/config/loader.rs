//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then
/// environment overrides. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let config = match path {
        Some(path) => load_file(path)?,
        None => RelayConfig::default(),
    };
    let config = apply_env(config, |var| std::env::var(var).ok())?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without applying environment overrides.
pub fn load_file(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables on top of `config`.
///
/// `lookup` abstracts the environment so tests never touch process state.
pub fn apply_env<F>(mut config: RelayConfig, lookup: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        config.listener.port = port.trim().parse().map_err(|e| ConfigError::Env {
            var: "PORT",
            reason: format!("{e}"),
        })?;
    }

    if let Some(domains) = lookup("ALLOWED_DOMAINS") {
        config.relay.allowed_domains = parse_domain_list(&domains);
    }

    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level.trim().to_ascii_lowercase();
    }

    if let Some(timeout) = lookup("REQUEST_TIMEOUT") {
        config.relay.request_timeout_secs = timeout.trim().parse().map_err(|e| ConfigError::Env {
            var: "REQUEST_TIMEOUT",
            reason: format!("{e}"),
        })?;
    }

    if let Some(path) = lookup("LOG_FILE").filter(|p| !p.trim().is_empty()) {
        config.observability.log_file = Some(path.trim().to_string());
    }

    if let Some(addr) = lookup("METRICS_ADDRESS").filter(|a| !a.trim().is_empty()) {
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = addr.trim().to_string();
    }

    Ok(config)
}

/// Split a comma-separated pattern list, trimming entries and dropping empties.
pub fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
        .collect()
}
