//! API error types and HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mctl_core::envelope::ValidationError;
use mctl_core::ledger::LedgerError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the HTTP handlers.
///
/// These map to specific status codes: validation failures are client
/// errors carrying the causing reason, storage failures are server errors
/// (callers retry, which is safe because inserts are idempotent), and an
/// unknown reason code is a structured not-found.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request payload failed validation; nothing was stored.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The backing store failed; the operation was aborted atomically.
    #[error("storage unavailable: {0}")]
    Storage(#[from] LedgerError),

    /// The requested runbook reason code is unknown.
    #[error("unknown reason code: {reason_code}")]
    UnknownReasonCode {
        /// The code that was requested.
        reason_code: String,
        /// Every known reason code.
        known_codes: Vec<&'static str>,
    },
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnknownReasonCode { .. } => StatusCode::NOT_FOUND,
        }
    }
}

/// Standard JSON error response body.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    /// Human-readable message (safe for clients).
    pub error: String,

    /// Known reason codes, present only for runbook lookup misses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_codes: Option<Vec<&'static str>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::Validation(reason) => ApiErrorBody {
                error: reason,
                known_codes: None,
            },
            // Storage details are logged, not exposed to clients.
            Self::Storage(err) => {
                error!(error = %err, "storage error while handling request");
                ApiErrorBody {
                    error: "storage unavailable".to_string(),
                    known_codes: None,
                }
            },
            Self::UnknownReasonCode {
                reason_code,
                known_codes,
            } => ApiErrorBody {
                error: format!("unknown reason code: {reason_code}"),
                known_codes: Some(known_codes),
            },
        };

        (status, Json(body)).into_response()
    }
}
