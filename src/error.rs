//! Error types shared by the storage layer, the cache and the HTTP glue.
//!
//! [`StoreError`] is the typed taxonomy produced by backends, the cache engine
//! and the health registry. It propagates unchanged through
//! [`crate::application::services::ShortService`]; only the HTTP layer turns
//! it into an [`AppError`] response.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;

/// Errors raised by storage backends, the cache engine and health checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("No such key: {0}")]
    NotFound(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Invalid value {0}")]
    InvalidValue(String),

    #[error("Empty value")]
    Empty,

    /// A conditional insert lost to a concurrent insert of the same key and the
    /// backend cannot tell whether the winner had the same owner.
    #[error("Conflicting concurrent write for {0}; outcome unknown")]
    Ambiguous(String),

    #[error("Deadline exceeded ({0:?})")]
    DeadlineExceeded(Duration),

    /// A persisted record could not be decoded.
    #[error("Corrupt record for {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Component {component} unhealthy: {reason}")]
    Unhealthy { component: String, reason: String },
}

impl StoreError {
    /// Wraps a driver or IO error.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn corrupt(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        let err = Self::Corrupt {
            key: key.into(),
            reason: err.to_string(),
        };
        tracing::error!(error = %err, "refusing to serve corrupted record");
        err
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for storage, cache and health operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
    details: Value,
}

/// HTTP-facing error with a JSON envelope.
#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    Unauthorized { message: String, details: Value },
    Forbidden { message: String, details: Value },
    NotFound { message: String, details: Value },
    Conflict { message: String, details: Value },
    Unavailable { message: String, details: Value },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => {
                AppError::not_found("Short link not found", json!({ "short": key }))
            }
            StoreError::PermissionDenied => {
                AppError::forbidden("Permission denied", json!({}))
            }
            StoreError::InvalidValue(value) => {
                AppError::bad_request("Invalid value", json!({ "value": value }))
            }
            StoreError::Empty => AppError::bad_request("Empty value", json!({})),
            StoreError::Ambiguous(key) => AppError::conflict(
                "Concurrent write detected, outcome unknown",
                json!({ "short": key }),
            ),
            e @ (StoreError::DeadlineExceeded(_) | StoreError::Unhealthy { .. }) => {
                AppError::unavailable("Service unhealthy", json!({ "reason": e.to_string() }))
            }
            StoreError::Corrupt { .. } | StoreError::Backend(_) => {
                AppError::internal("Storage error", json!({}))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, details) = match self {
            AppError::Validation { message, details } => ("validation_error", message, details),
            AppError::Unauthorized { message, details } => ("unauthorized", message, details),
            AppError::Forbidden { message, details } => ("forbidden", message, details),
            AppError::NotFound { message, details } => ("not_found", message, details),
            AppError::Conflict { message, details } => ("conflict", message, details),
            AppError::Unavailable { message, details } => ("unavailable", message, details),
            AppError::Internal { message, details } => ("internal_error", message, details),
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}
