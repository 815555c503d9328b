//! Stage executors
//!
//! The controller delegates the work of each stage to a `StageExecutor`. An
//! executor reports what it found and, optionally, a failure signal; it never
//! touches job state itself.

pub mod remote;
pub mod simulated;

pub use remote::RemoteRecognizer;
pub use simulated::SimulatedRecognizer;

use std::sync::Arc;
use uuid::Uuid;

use crate::models::{DetectedElements, Document, ProcessingOptions};
use crate::services::{FailureSignal, Stage};

/// Everything an executor may read while running one stage
#[derive(Debug, Clone)]
pub struct StageContext {
    pub job_id: Uuid,
    pub stage_index: usize,
    pub stage: Stage,
    /// Nominal duration of this stage scaled by the processing mode
    pub estimated_duration_ms: u64,
    pub document: Arc<Document>,
    pub options: ProcessingOptions,
}

/// What one stage produced
#[derive(Debug, Clone, Default)]
pub struct StageOutcome {
    /// Partial element update, merged by the controller
    pub elements: Option<DetectedElements>,
    /// Failure detected by the stage itself
    pub failure: Option<FailureSignal>,
}

impl StageOutcome {
    pub fn with_elements(elements: DetectedElements) -> Self {
        Self {
            elements: Some(elements),
            failure: None,
        }
    }

    pub fn failed(signal: FailureSignal) -> Self {
        Self {
            elements: None,
            failure: Some(signal),
        }
    }
}

/// Performs the work of a single stage
///
/// Errors returned here are transport or infrastructure failures; the
/// controller classifies them from their message like any other failure.
#[async_trait::async_trait]
pub trait StageExecutor: Send + Sync {
    /// Executor name for logs
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &StageContext) -> anyhow::Result<StageOutcome>;
}
