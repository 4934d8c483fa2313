//! Handler for deleting a short alias.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::{Value, json};
use tracing::info;

use crate::api::dto::short::DeleteRequest;
use crate::api::middleware::Owner;
use crate::error::AppError;
use crate::state::AppState;

/// Deletes a short alias owned by the caller.
///
/// # Endpoint
///
/// `POST /delete`
///
/// # Request Body
///
/// ```json
/// { "Short": "miserable" }
/// ```
///
/// Deleting an alias that does not exist succeeds on backends that can tell
/// it apart from one owned by someone else; the column store reports 403.
///
/// # Errors
///
/// - 400 Bad Request for a malformed body or alias
/// - 401 Unauthorized without a caller identity
/// - 403 Forbidden if another user owns the alias
pub async fn delete_handler(
    State(state): State<AppState>,
    Owner(owner): Owner,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(req) = payload.map_err(|e| {
        AppError::bad_request("Invalid request body", json!({ "reason": e.body_text() }))
    })?;

    state.shorts.delete_short(&req.short, owner).await?;

    info!(short = %req.short, owner, "deleted");
    Ok(Json(json!({})))
}
