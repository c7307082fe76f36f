//! HTTP to HTTPS Relay Server
//!
//! Accepts HTTP requests and relays them to whitelisted HTTPS endpoints.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                      RELAY                       │
//!     Client Request      │  ┌────────┐   ┌──────────┐   ┌────────────────┐  │
//!     ────────────────────┼─▶│  http  │──▶│  target  │──▶│    routing     │  │
//!     (X-Target-URL)      │  │ server │   │ validate │   │ allow-list glob│  │
//!                         │  └────────┘   └──────────┘   └───────┬────────┘  │
//!                         │                                      ▼           │
//!                         │                              ┌────────────────┐  │
//!                         │                              │ header strip   │  │
//!                         │                              └───────┬────────┘  │
//!                         │                                      ▼           │
//!     Client Response     │  ┌────────┐   ┌──────────┐   ┌────────────────┐  │   HTTPS
//!     ◀───────────────────┼──│response│◀──│ header   │◀──│   dispatch     │◀─┼──── Upstream
//!                         │  │ / error│   │ strip    │   │ timeout, TLS   │  │
//!                         │  └────────┘   └──────────┘   └────────────────┘  │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use https_relay::config::load_config;
use https_relay::lifecycle::startup;
use https_relay::observability::logging;
use https_relay::Shutdown;

#[derive(Parser)]
#[command(name = "https-relay")]
#[command(version, about = "Relay plaintext HTTP requests to allow-listed HTTPS endpoints")]
struct Args {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.listener.port,
        "Starting HTTP to HTTPS Relay Server"
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    startup::start(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
