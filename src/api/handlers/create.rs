//! Handler for creating or replacing a short alias.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::json;
use tracing::info;

use crate::api::dto::short::{CreateRequest, ShortResponse};
use crate::api::middleware::Owner;
use crate::domain::entities::ShortRecord;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::validation::normalize_long;

/// Points a short alias at a long URL on behalf of the caller.
///
/// # Endpoint
///
/// `POST /create`
///
/// # Request Body
///
/// ```json
/// { "Short": "miserable", "Long": "pigeon.example" }
/// ```
///
/// The long URL gets an `http://` prefix when it has no HTTP scheme. An
/// alias already owned by the caller is overwritten.
///
/// # Response
///
/// ```json
/// { "Short": "miserable", "Long": "http://pigeon.example", "Owner": 7 }
/// ```
///
/// # Errors
///
/// - 400 Bad Request for a malformed body, alias or URL, or a reserved alias
/// - 401 Unauthorized without a caller identity
/// - 403 Forbidden if another user owns the alias
/// - 409 Conflict if a concurrent create left the outcome unknown
pub async fn create_handler(
    State(state): State<AppState>,
    Owner(owner): Owner,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<Json<ShortResponse>, AppError> {
    let Json(req) = payload.map_err(|e| {
        AppError::bad_request("Invalid request body", json!({ "reason": e.body_text() }))
    })?;

    let long = normalize_long(&req.long)?;
    let record = state
        .shorts
        .write_short(ShortRecord::new(req.short, long, owner))
        .await?;

    info!(short = %record.short, long = %record.long, owner, "created");
    Ok(Json(record.into()))
}
