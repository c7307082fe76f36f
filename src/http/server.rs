//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, body limit, request ID)
//! - Bind server to listener
//! - Dispatch relay requests to the pipeline
//! - Stop accepting on shutdown and drain in-flight requests

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, MethodRouter},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::handlers::{self, HEALTH_PATH, RELAY_PATH};
use crate::relay::{HttpsUpstream, PipelineError, RelayPipeline, Upstream};

/// Application state injected into handlers.
pub struct AppState<U = HttpsUpstream> {
    pub pipeline: Arc<RelayPipeline<U>>,
    /// Target header name as configured (original casing), for the info page.
    pub display_header: String,
    pub port: u16,
}

// Manual impl: derive would require `U: Clone`.
impl<U> Clone for AppState<U> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            display_header: self.display_header.clone(),
            port: self.port,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("server IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a server that relays through the real HTTPS client.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let pipeline = RelayPipeline::from_settings(&config.relay)?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create a server around an existing pipeline.
    pub fn with_pipeline<U: Upstream>(config: RelayConfig, pipeline: RelayPipeline<U>) -> Self {
        let state = AppState {
            pipeline: Arc::new(pipeline),
            display_header: config.relay.target_header.clone(),
            port: config.listener.port,
        };
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The assembled router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router<U: Upstream>(config: &RelayConfig, state: AppState<U>) -> Router {
    Router::new()
        .route(RELAY_PATH, relay_methods::<U>())
        .route(HEALTH_PATH, get(handlers::health::<U>))
        .route("/", get(handlers::info::<U>))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.relay.max_body_size))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

fn relay_methods<U: Upstream>() -> MethodRouter<AppState<U>> {
    get(handlers::relay::<U>)
        .head(handlers::relay::<U>)
        .post(handlers::relay::<U>)
        .put(handlers::relay::<U>)
        .delete(handlers::relay::<U>)
        .patch(handlers::relay::<U>)
        .options(handlers::relay::<U>)
}
