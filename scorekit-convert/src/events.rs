//! Conversion events broadcast on the controller's `EventBus`
//!
//! Serialized with a `type` tag for SSE transmission.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{DetectedElements, JobStatus, ProcessingError, ProcessingMode, TrackInfo};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ConversionEvent {
    /// Job accepted; the upload stage is about to run
    JobStarted {
        job_id: Uuid,
        document_name: String,
        processing_mode: ProcessingMode,
        /// Scaled nominal duration of the whole run
        estimated_total_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A stage finished and its progress was published
    StageCompleted {
        job_id: Uuid,
        status: JobStatus,
        progress: u8,
        stage_index: usize,
        current_stage_label: String,
        estimated_remaining_ms: u64,
        /// Everything detected so far
        detected_elements: DetectedElements,
        timestamp: DateTime<Utc>,
    },

    /// Terminal: success or partial success
    JobSucceeded {
        job_id: Uuid,
        status: JobStatus,
        file_name: String,
        title: String,
        composer: String,
        confidence: f64,
        tracks: Vec<TrackInfo>,
        flagged_sections: Vec<String>,
        midi_size_bytes: usize,
        timestamp: DateTime<Utc>,
    },

    /// Terminal: a stage raised a classified failure
    JobFailed {
        job_id: Uuid,
        progress: u8,
        error: ProcessingError,
        timestamp: DateTime<Utc>,
    },

    /// Terminal: cancelled before completion
    JobCancelled {
        job_id: Uuid,
        /// Progress frozen at cancellation
        progress: u8,
        timestamp: DateTime<Utc>,
    },

    /// Controller returned to idle
    JobReset {
        /// Job that was discarded, if any
        job_id: Option<Uuid>,
        timestamp: DateTime<Utc>,
    },
}

impl ConversionEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            ConversionEvent::JobStarted { .. } => "JobStarted",
            ConversionEvent::StageCompleted { .. } => "StageCompleted",
            ConversionEvent::JobSucceeded { .. } => "JobSucceeded",
            ConversionEvent::JobFailed { .. } => "JobFailed",
            ConversionEvent::JobCancelled { .. } => "JobCancelled",
            ConversionEvent::JobReset { .. } => "JobReset",
        }
    }

    pub fn job_id(&self) -> Option<Uuid> {
        match self {
            ConversionEvent::JobStarted { job_id, .. }
            | ConversionEvent::StageCompleted { job_id, .. }
            | ConversionEvent::JobSucceeded { job_id, .. }
            | ConversionEvent::JobFailed { job_id, .. }
            | ConversionEvent::JobCancelled { job_id, .. } => Some(*job_id),
            ConversionEvent::JobReset { job_id, .. } => *job_id,
        }
    }

    /// True for the events that end a job
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConversionEvent::JobSucceeded { .. }
                | ConversionEvent::JobFailed { .. }
                | ConversionEvent::JobCancelled { .. }
        )
    }
}
