//! Conversion API handlers
//!
//! POST /convert, GET /convert/status, GET /convert/outcome, GET /convert/midi,
//! POST /convert/cancel, POST /convert/reset

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        Document, JobOutcome, JobSnapshot, JobStatus, ProcessingError, ProcessingOptions,
        ProcessingResult,
    },
    AppState,
};

/// POST /convert request
#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub file_name: String,
    /// Document bytes, standard base64
    pub document: String,
    #[serde(default)]
    pub options: ProcessingOptions,
}

/// POST /convert response
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub estimated_total_ms: u64,
}

/// GET /convert/status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub snapshot: JobSnapshot,
    /// e.g. "8.4s"
    pub estimated_remaining: String,
}

/// GET /convert/outcome response
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OutcomeResponse {
    Completed {
        status: JobStatus,
        result: ProcessingResult,
        midi_size_bytes: usize,
    },
    Failed {
        error: ProcessingError,
    },
    Cancelled,
}

/// POST /convert
///
/// Starts a conversion. Returns 202 Accepted with the job id.
pub async fn start_conversion(
    State(state): State<AppState>,
    Json(request): Json<ConvertRequest>,
) -> ApiResult<(StatusCode, Json<ConvertResponse>)> {
    if request.file_name.trim().is_empty() {
        return Err(ApiError::BadRequest("file_name must not be empty".to_string()));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(request.document.trim())
        .map_err(|e| ApiError::BadRequest(format!("document is not valid base64: {}", e)))?;

    let document = Document::new(request.file_name, bytes);
    let handle = state.controller.submit(document, request.options).await?;

    tracing::info!(job_id = %handle.job_id, "Conversion started via API");

    let response = ConvertResponse {
        job_id: handle.job_id,
        status: handle.status,
        estimated_total_ms: handle.estimated_total_ms,
    };

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /convert/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.controller.snapshot().await;
    let estimated_remaining =
        scorekit_common::human_time::format_duration_ms(snapshot.estimated_remaining_ms);

    Json(StatusResponse {
        snapshot,
        estimated_remaining,
    })
}

/// GET /convert/outcome
///
/// 404 until the current job reaches a terminal state.
pub async fn get_outcome(State(state): State<AppState>) -> ApiResult<Json<OutcomeResponse>> {
    let (status, outcome) = state
        .controller
        .finished()
        .await
        .ok_or_else(|| ApiError::NotFound("No finished conversion".to_string()))?;

    let response = match outcome {
        JobOutcome::Completed(result) => OutcomeResponse::Completed {
            status,
            midi_size_bytes: result.midi_size_bytes(),
            result,
        },
        JobOutcome::Failed(error) => OutcomeResponse::Failed { error },
        JobOutcome::Cancelled => OutcomeResponse::Cancelled,
    };

    Ok(Json(response))
}

/// GET /convert/midi
///
/// Downloads the generated MIDI file.
pub async fn download_midi(State(state): State<AppState>) -> ApiResult<Response> {
    let result = state
        .controller
        .result()
        .await
        .ok_or_else(|| ApiError::NotFound("No MIDI result available".to_string()))?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        result.file_name.replace('"', "")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "audio/midi".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        result.midi_data,
    )
        .into_response())
}

/// POST /convert/cancel
pub async fn cancel_conversion(State(state): State<AppState>) -> ApiResult<Json<JobSnapshot>> {
    let snapshot = state.controller.cancel().await?;
    Ok(Json(snapshot))
}

/// POST /convert/reset
pub async fn reset_conversion(State(state): State<AppState>) -> Json<JobSnapshot> {
    Json(state.controller.reset().await)
}

/// Build conversion routes
pub fn conversion_routes() -> Router<AppState> {
    Router::new()
        .route("/convert", post(start_conversion))
        .route("/convert/status", get(get_status))
        .route("/convert/outcome", get(get_outcome))
        .route("/convert/midi", get(download_midi))
        .route("/convert/cancel", post(cancel_conversion))
        .route("/convert/reset", post(reset_conversion))
}
