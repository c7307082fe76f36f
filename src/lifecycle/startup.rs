//! Startup orchestration.
//!
//! # Responsibilities
//! - Report the effective configuration
//! - Start the metrics exporter when enabled
//! - Build the relay, bind the listener, serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::RelayConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Run the relay with a validated configuration until `shutdown` fires.
pub async fn start(config: RelayConfig, shutdown: &Shutdown) -> Result<(), ServerError> {
    tracing::info!(
        bind_address = %config.bind_address(),
        request_timeout_secs = config.relay.request_timeout_secs,
        target_header = %config.relay.target_header,
        "Configuration loaded"
    );

    if config.relay.allowed_domains.is_empty() {
        tracing::warn!("No allowed domains configured! All requests will be blocked.");
    } else {
        tracing::info!(allowed_domains = ?config.relay.allowed_domains, "Allowed domains");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(server.config().bind_address()).await?;

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server.run(listener, shutdown.subscribe()).await
}
