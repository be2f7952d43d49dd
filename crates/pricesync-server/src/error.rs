//! Mapping of pipeline errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pricesync::{ErrorKind, SyncError};
use serde::Serialize;
use thiserror::Error;

/// Message shown for every server-side failure; the cause is only logged.
const INTERNAL_MESSAGE: &str = "Internal server error occurred";

/// Error returned by request handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A failure reported by the ingestion or query services.
    #[error(transparent)]
    Sync(#[from] SyncError),
    /// A request parameter is missing or malformed.
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            Self::Sync(e) => match e.kind() {
                ErrorKind::Validation => (StatusCode::BAD_REQUEST, e.to_string()),
                ErrorKind::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
                _ => {
                    tracing::error!(error = %e, cause = %e.root_cause(), "request failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message,
        });
        (status, body).into_response()
    }
}

/// Handler result.
pub type ApiResult<T> = Result<T, ApiError>;
