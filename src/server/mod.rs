//! HTTP server: shared context, router construction, startup and shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::signal;
use tokio::sync::Semaphore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::{Error, Result};

pub mod error;
pub mod routes_convert;

/// Shared application context (via Axum state).
///
/// Cheaply cloneable: only `Arc`s and an `Instant`.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable process configuration, read from the environment once.
    pub config: Arc<Config>,
    /// Global gate on concurrent codec invocations, shared by every
    /// in-flight request. FIFO permit order keeps admission fair.
    pub encode_permits: Arc<Semaphore>,
    started_at: Instant,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        let permits = config.conversion.concurrency.max(1);
        Self {
            config: Arc::new(config),
            encode_permits: Arc::new(Semaphore::new(permits)),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Build the complete Axum router.
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // The per-file limit is enforced while collecting the form; the body
    // limit only has to stop a request that could never be valid.
    let body_limit = ctx.config.limits.request_body_limit();

    Router::new()
        .route("/health", get(health_check))
        .route("/convert", post(routes_convert::convert))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "uptimeSeconds": ctx.uptime_seconds(),
    }))
}

/// Start the HTTP server and block until shutdown.
pub async fn start_server(config: Config) -> Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::new(config);
    let app = create_router(ctx);

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
