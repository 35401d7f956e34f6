//! HTTP service for artifact-store.
//!
//! A thin routing layer over [`LocalArtifactStore`]. Store calls block on
//! the filesystem, so handlers run them on the blocking thread pool.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::storage::local::LocalArtifactStore;

pub use error::AppError;

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LocalArtifactStore>,
}

impl AppState {
    #[must_use]
    pub fn new(store: LocalArtifactStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Build the Axum application with all routes and middleware.
#[must_use]
pub fn build_app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::file_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Start the API server and run until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(store: LocalArtifactStore, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = build_app(AppState::new(store), config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot bind {addr}: {e}"))?;

    tracing::info!("artifact-store listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("artifact-store stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
