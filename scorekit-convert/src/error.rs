//! Error types for scorekit-convert
//!
//! `ControllerError` covers requests the controller refuses; failures that
//! happen while a job runs are `ProcessingError`s delivered as the job's
//! outcome instead. `ApiError` maps both onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::JobStatus;

/// Rejected controller request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    /// A non-terminal job already exists
    #[error("Job {job_id} is still {status:?}")]
    JobActive { job_id: Uuid, status: JobStatus },

    #[error("Document is empty")]
    EmptyDocument,

    #[error("Invalid processing options: {0}")]
    InvalidOptions(String),

    /// Cancel requested while nothing runs
    #[error("No conversion is running")]
    NoActiveJob,
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. a conversion is already running
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        match err {
            ControllerError::JobActive { .. } => ApiError::Conflict(err.to_string()),
            ControllerError::EmptyDocument
            | ControllerError::InvalidOptions(_)
            | ControllerError::NoActiveJob => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
