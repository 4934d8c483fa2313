//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /healthz`   - Health of every registered component
//! - `POST /create`    - Create or overwrite an alias (caller identity required)
//! - `POST /delete`    - Delete an alias (caller identity required)
//! - `GET  /{short}`   - Redirect to the long URL
//!
//! The reserved aliases `create`, `delete` and `healthz` can never be
//! stored, so the fixed routes never shadow a user's alias.

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .merge(api::routes::write_routes())
        .route("/{short}", get(redirect_handler))
        .with_state(state)
        .layer(tracing::layer())
}
