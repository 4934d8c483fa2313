//! Handler for health check endpoint.

use axum::extract::State;

use crate::error::AppError;
use crate::state::AppState;

/// Checks every registered component in registration order.
///
/// # Endpoint
///
/// `GET /healthz`
///
/// # Response Codes
///
/// - **200 OK** with body `ok`: all components healthy
/// - **503 Service Unavailable**: the first failing component, or the
///   deadline passed before every component answered
pub async fn health_handler(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.health.check_all().await?;
    Ok("ok")
}
