//! HTTP server initialization and runtime setup.
//!
//! Opens the storage backend, builds the cache and services, and runs the
//! Axum server until Ctrl-C.

use crate::application::services::ShortService;
use crate::config::Config;
use crate::health::HealthRegistry;
use crate::infrastructure::persistence;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Health registry with the configured deadline
/// - Storage backend (registered as the first health component)
/// - Read-through cache and short service (registered second)
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - The storage backend cannot be opened
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let health = Arc::new(HealthRegistry::new(config.health_deadline()));

    let backend = persistence::open(&config.storage, &health)
        .await
        .context("Failed to open storage backend")?;

    let shorts = Arc::new(ShortService::with_capacity(
        backend,
        config.cache_size,
        config.cache_ttl(),
    ));
    health.register(shorts.clone());
    if shorts.is_cache_enabled() {
        tracing::info!(capacity = config.cache_size, ttl = ?config.cache_ttl(), "Cache enabled");
    } else {
        tracing::info!("Cache disabled");
    }

    let state = AppState::new(shorts, health);
    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
