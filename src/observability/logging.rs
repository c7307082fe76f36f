//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Mirror output to a log file when one is configured
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - A log file that cannot be opened degrades to stdout only

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default filter directives for a log level.
pub fn default_directives(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    format!("https_relay={level},tower_http={level}")
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(&config.log_level).into());

    let (file, file_error) = match config.log_file.as_deref() {
        Some(path) => match open_log_file(Path::new(path)) {
            Ok(file) => (Some(file), None),
            Err(e) => (None, Some((path.to_string(), e))),
        },
        None => (None, None),
    };

    let file_layer = file.map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    if let Some((path, error)) = file_error {
        tracing::warn!(path = %path, error = %error, "Could not open log file; logging to stdout only");
    }
}

/// Open `path` for appending, creating its parent directory if needed.
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
