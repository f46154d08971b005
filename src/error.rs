//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code and a
//! machine-readable `code` field.
//!
//! **Security note:** internal errors (database, generation) are logged with
//! full detail but only a generic message is returned to the caller so that
//! file paths, SQL, or other implementation details never leak to clients.
//! Ownership violations on sessions are reported as `NotFound` so callers
//! cannot probe which session ids exist for other users.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::permission::Role;
use crate::auth::token::TokenError;

/// All errors that can occur in the study-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// No usable credential; the sub-code distinguishes missing, invalid
    /// signature, and expired tokens so clients can decide whether a silent
    /// refresh is worth attempting.
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] TokenError),

    /// Authenticated but the role is insufficient for this route.
    #[error("forbidden: requires one of {required:?}, current role is {current}")]
    Forbidden { required: Vec<Role>, current: Role },

    /// The caller sent an invalid or malformed request.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller referenced a resource that does not exist, or one it
    /// does not own; the two cases are reported identically.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with existing state (duplicate).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Propagated from the SQLite (or other) store.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Stable machine-readable code for the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::Unauthenticated(e) => e.code(),
            ServerError::Forbidden { .. } => "forbidden",
            ServerError::Validation(_) => "validation_error",
            ServerError::NotFound(_) => "not_found",
            ServerError::Conflict(_) => "conflict",
            ServerError::Database(_) => "unavailable",
            ServerError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, body) = match &self {
            ServerError::Unauthenticated(e) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": e.to_string(), "code": code }),
            ),
            ServerError::Forbidden { required, current } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "insufficient role",
                    "code": code,
                    "required": required,
                    "current": current,
                }),
            ),
            ServerError::Validation(m) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": m, "code": code }),
            ),
            ServerError::NotFound(m) => (
                StatusCode::NOT_FOUND,
                json!({ "error": m, "code": code }),
            ),
            ServerError::Conflict(m) => (
                StatusCode::CONFLICT,
                json!({ "error": m, "code": code }),
            ),
            // Internal errors: log the full detail, return a generic message.
            ServerError::Database(e) => {
                error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "storage unavailable", "code": code }),
                )
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal server error", "code": code }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        // Preserve the full chain in the logs even though clients only see
        // a generic message.
        error!(error = ?e, "converting anyhow error to ServerError::Internal");
        ServerError::Internal(e.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
