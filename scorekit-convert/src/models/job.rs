//! Conversion job state machine
//!
//! A job progresses through the four phases and ends in one terminal state:
//! IDLE → UPLOADING → ANALYZING → PROCESSING → GENERATING →
//! SUCCESS | PARTIAL_SUCCESS | ERROR (or CANCELLED)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DetectedElements, ProcessingError, ProcessingOptions, ProcessingResult};
use crate::services::ElementAccumulator;

/// Named grouping of consecutive stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Upload,
    Analysis,
    Processing,
    Generation,
}

impl Phase {
    /// Controller status while a stage of this phase runs
    pub fn status(self) -> JobStatus {
        match self {
            Phase::Upload => JobStatus::Uploading,
            Phase::Analysis => JobStatus::Analyzing,
            Phase::Processing => JobStatus::Processing,
            Phase::Generation => JobStatus::Generating,
        }
    }
}

/// Controller status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Idle,
    Uploading,
    Analyzing,
    Processing,
    Generating,
    /// All stages completed with full confidence
    Success,
    /// All stages completed, some sections flagged as uncertain
    PartialSuccess,
    /// A stage raised a classified failure
    Error,
    /// Cancelled before completion
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Success | JobStatus::PartialSuccess | JobStatus::Error | JobStatus::Cancelled
        )
    }

    /// Working through the stages
    pub fn is_running(self) -> bool {
        matches!(
            self,
            JobStatus::Uploading | JobStatus::Analyzing | JobStatus::Processing | JobStatus::Generating
        )
    }

    /// Running statuses move forward through the phases or into a terminal
    /// status. Idle and terminal statuses never change.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if !self.is_running() {
            return false;
        }
        next.is_terminal() || (next.is_running() && phase_rank(next) > phase_rank(self))
    }
}

fn phase_rank(status: JobStatus) -> u8 {
    match status {
        JobStatus::Uploading => 1,
        JobStatus::Analyzing => 2,
        JobStatus::Processing => 3,
        JobStatus::Generating => 4,
        _ => 0,
    }
}

/// Status transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub job_id: Uuid,
    pub old_status: JobStatus,
    pub new_status: JobStatus,
    pub transitioned_at: DateTime<Utc>,
}

/// Terminal outcome delivered once per job
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Completed(ProcessingResult),
    Failed(ProcessingError),
    Cancelled,
}

impl JobOutcome {
    pub fn result(&self) -> Option<&ProcessingResult> {
        match self {
            JobOutcome::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ProcessingError> {
        match self {
            JobOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Live job aggregate, owned by the controller for the duration of one run
#[derive(Debug, Clone)]
pub struct Job {
    pub job_id: Uuid,
    pub document_name: String,
    /// SHA-256 of the submitted bytes
    pub document_digest: String,
    pub options: ProcessingOptions,
    pub status: JobStatus,
    /// Percentage complete (0 - 100)
    pub progress: u8,
    pub current_stage_index: Option<usize>,
    pub current_stage_label: Option<String>,
    pub estimated_remaining_ms: u64,
    pub elements: ElementAccumulator,
    pub result: Option<ProcessingResult>,
    pub error: Option<ProcessingError>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a job in the upload phase
    pub fn new(
        document_name: String,
        document_digest: String,
        options: ProcessingOptions,
        estimated_total_ms: u64,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            document_name,
            document_digest,
            options,
            status: JobStatus::Uploading,
            progress: 0,
            current_stage_index: None,
            current_stage_label: None,
            estimated_remaining_ms: estimated_total_ms,
            elements: ElementAccumulator::new(),
            result: None,
            error: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to new status
    ///
    /// Returns `None`, leaving the status unchanged, if the move is not allowed.
    pub fn transition_to(&mut self, new_status: JobStatus) -> Option<StateTransition> {
        if !self.status.can_transition_to(new_status) {
            tracing::warn!(
                job_id = %self.job_id,
                from = ?self.status,
                to = ?new_status,
                "Rejected job status transition"
            );
            return None;
        }

        let transition = StateTransition {
            job_id: self.job_id,
            old_status: self.status,
            new_status,
            transitioned_at: Utc::now(),
        };
        self.status = new_status;

        if new_status.is_terminal() {
            self.ended_at = Some(Utc::now());
        }

        Some(transition)
    }

    /// Record a started stage
    pub fn begin_stage(&mut self, index: usize, label: &str) {
        self.current_stage_index = Some(index);
        self.current_stage_label = Some(label.to_string());
    }

    /// Publish a completed stage's progress and remaining time
    ///
    /// Progress never decreases; a lower weight is ignored.
    pub fn complete_stage(&mut self, progress: u8, estimated_remaining_ms: u64) {
        self.progress = self.progress.max(progress.min(100));
        self.estimated_remaining_ms = estimated_remaining_ms;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Copy of the observable fields
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: Some(self.job_id),
            status: self.status,
            progress: self.progress,
            current_stage_index: self.current_stage_index,
            current_stage_label: self.current_stage_label.clone(),
            estimated_remaining_ms: self.estimated_remaining_ms,
            detected_elements: self.elements.snapshot(),
            document_name: Some(self.document_name.clone()),
            processing_mode: Some(self.options.processing_mode),
            has_result: self.result.is_some(),
            error: self.error.clone(),
            started_at: Some(self.started_at),
            ended_at: self.ended_at,
        }
    }
}

/// Point-in-time view of the controller, safe to hand to other tasks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub job_id: Option<Uuid>,
    pub status: JobStatus,
    pub progress: u8,
    pub current_stage_index: Option<usize>,
    pub current_stage_label: Option<String>,
    pub estimated_remaining_ms: u64,
    pub detected_elements: DetectedElements,
    pub document_name: Option<String>,
    pub processing_mode: Option<super::ProcessingMode>,
    pub has_result: bool,
    pub error: Option<ProcessingError>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl JobSnapshot {
    /// Snapshot of a controller with no job
    pub fn idle() -> Self {
        Self {
            job_id: None,
            status: JobStatus::Idle,
            progress: 0,
            current_stage_index: None,
            current_stage_label: None,
            estimated_remaining_ms: 0,
            detected_elements: DetectedElements::default(),
            document_name: None,
            processing_mode: None,
            has_result: false,
            error: None,
            started_at: None,
            ended_at: None,
        }
    }
}
