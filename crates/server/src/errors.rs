use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::{metrics::CLIENT_ERRORS_TOTAL, types::MessageBody};
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{debug, error};

/// Message sent when a mutation succeeded in memory but the file rewrite failed
/// and strict persistence is on.
pub const PERSIST_FAILED: &str = "Failed to persist database file.";

/// Handler error: every client-caused failure is a 400 with `{"message": ...}`.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub ServiceError);

/// A `:name` segment that cannot be decoded can never match a stored record.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!(error = %rejection, "undecodable record name");
        Self(ServiceError::NotFound)
    }
}

/// Unreadable bodies are reported like any other malformed payload.
impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        debug!(error = %rejection, "unreadable request body");
        Self(ServiceError::Malformed)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_client_error() {
            CLIENT_ERRORS_TOTAL.inc();
            return (StatusCode::BAD_REQUEST, Json(MessageBody::new(err.to_string()))).into_response();
        }
        error!(error = %err, "request failed on persistence");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(MessageBody::new(PERSIST_FAILED))).into_response()
    }
}
