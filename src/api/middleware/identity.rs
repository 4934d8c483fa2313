//! Caller identity for write endpoints.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::json;

use crate::error::AppError;

/// Header carrying the authenticated user id.
///
/// Authentication happens upstream; the proxy in front of the service
/// verifies the session and forwards the user's numeric id here. The service
/// trusts the header as-is, so it must never be reachable without that proxy.
pub const OWNER_HEADER: &str = "x-owner-id";

/// The user on whose behalf a write is made.
///
/// # Errors
///
/// Rejects with `401 Unauthorized` if the header is missing or not a
/// decimal `u64`.
///
/// # Example
///
/// ```rust,ignore
/// async fn create_handler(Owner(owner): Owner, ...) { ... }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub u64);

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Owner)
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({ "reason": "X-Owner-Id header is missing or invalid" }),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(header: Option<&str>) -> Result<Owner, AppError> {
        let mut builder = Request::builder().uri("/create");
        if let Some(value) = header {
            builder = builder.header(OWNER_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Owner::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_owner_from_header() {
        assert_eq!(extract(Some("7")).await.unwrap(), Owner(7));
        assert_eq!(
            extract(Some("18446744073709551615")).await.unwrap(),
            Owner(u64::MAX)
        );
    }

    #[tokio::test]
    async fn test_missing_or_invalid_owner() {
        for header in [None, Some(""), Some("-1"), Some("seven")] {
            let err = extract(header).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "{header:?}");
        }
    }
}
