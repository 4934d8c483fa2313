//! API route configuration.
//!
//! Write endpoints identify the caller with the
//! [`crate::api::middleware::Owner`] extractor.

use crate::api::handlers::{create_handler, delete_handler};
use crate::state::AppState;
use axum::{Router, routing::post};

/// Routes that change stored aliases.
///
/// # Endpoints
///
/// - `POST /create` - Create or overwrite an alias owned by the caller
/// - `POST /delete` - Delete an alias owned by the caller
pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_handler))
        .route("/delete", post(delete_handler))
}
