//! Handler for short alias redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short alias to its long URL.
///
/// # Endpoint
///
/// `GET /{short}`
///
/// # Request Flow
///
/// 1. Look the alias up through the read-through cache
/// 2. On a miss or an expired entry, read it from the storage backend
/// 3. Return 307 Temporary Redirect
///
/// # Errors
///
/// Returns 404 Not Found if the alias doesn't exist.
pub async fn redirect_handler(
    Path(short): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    match state.shorts.read_short(&short).await {
        Ok(long) => {
            debug!(short = %short, long = %long, "redirect");
            Ok(Redirect::temporary(&long))
        }
        Err(e) => {
            warn!(short = %short, error = %e, "no url found");
            Err(e.into())
        }
    }
}
