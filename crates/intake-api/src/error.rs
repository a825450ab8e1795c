//! API error types and JSON error response formatting.
//!
//! Every failure leaves the server as `{error, message}` with a 4xx/5xx
//! status. Collaborator failures never reach this layer; they are absorbed
//! into fallback text further down.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use intake_core::IntakeError;
use serde::Serialize;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error kind (e.g., "bad_request", "session_not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 - missing or malformed input.
    BadRequest(String),
    /// 404 - the session id does not name a live session.
    SessionNotFound(String),
    /// 422 - the session exists but has nothing to summarize.
    EmptySession(String),
    /// 500 - the session store refused the operation.
    Storage(String),
    /// 500 - unexpected server error.
    Internal(String),
    /// 503 - a required collaborator is not configured.
    ServiceUnavailable(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::SessionNotFound(msg) => (StatusCode::NOT_FOUND, "session_not_found", msg),
            ApiError::EmptySession(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "empty_session", msg)
            }
            ApiError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = error_code, message, "Request failed");
        }

        let body = ErrorBody {
            error: error_code.to_string(),
            message: message.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        let msg = err.to_string();
        match err {
            IntakeError::SessionNotFound(_) => ApiError::SessionNotFound(msg),
            IntakeError::EmptySession(_) => ApiError::EmptySession(msg),
            IntakeError::Storage(_) => ApiError::Storage(msg),
            _ => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}
