//! Pipeline controller
//!
//! Owns at most one conversion job. `submit` validates the request, installs
//! a fresh `Job` and spawns a runner task that walks the stage catalog; the
//! runner is the only writer of stage progress. Observers read snapshots under
//! the shared `RwLock` or subscribe to the event bus.
//!
//! A terminal job stays visible (status, result or error) until it is reset
//! or replaced by the next submission.

mod runner;

use chrono::Utc;
use scorekit_common::EventBus;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{
    ErrorClassifier, EtaEstimator, FailureSource, MetadataMidiEncoder, MidiEncoder,
    ResultFinalizer, StageCatalog,
};
use crate::error::ControllerError;
use crate::events::ConversionEvent;
use crate::executors::StageExecutor;
use crate::models::{Document, Job, JobOutcome, JobSnapshot, JobStatus, ProcessingOptions, ProcessingResult};
use runner::JobRunner;

/// Job slot shared between the controller and its runner
#[derive(Default)]
pub(crate) struct ControllerState {
    job: Option<Job>,
    cancel: Option<CancellationToken>,
}

impl ControllerState {
    /// The job `job_id`, if it is still installed and not terminal
    ///
    /// A runner whose job was cancelled, reset or replaced gets `None` and
    /// must stop without writing.
    fn live_job(&mut self, job_id: Uuid) -> Option<&mut Job> {
        self.job
            .as_mut()
            .filter(|job| job.job_id == job_id && !job.is_terminal())
    }
}

/// Handle to a submitted job
#[derive(Debug)]
pub struct JobHandle {
    pub job_id: Uuid,
    /// Status the job was accepted in
    pub status: JobStatus,
    pub estimated_total_ms: u64,
    outcome: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    /// Wait for the terminal outcome
    ///
    /// Resolves to `Cancelled` if the runner went away without reporting.
    pub async fn wait(self) -> JobOutcome {
        self.outcome.await.unwrap_or(JobOutcome::Cancelled)
    }
}

pub struct PipelineController {
    catalog: Arc<StageCatalog>,
    eta: EtaEstimator,
    executor: Arc<dyn StageExecutor>,
    failures: Arc<dyn FailureSource>,
    classifier: ErrorClassifier,
    finalizer: Arc<ResultFinalizer>,
    event_bus: EventBus<ConversionEvent>,
    state: Arc<RwLock<ControllerState>>,
}

impl PipelineController {
    /// Controller over the standard catalog with the metadata MIDI encoder
    pub fn new(
        executor: Arc<dyn StageExecutor>,
        failures: Arc<dyn FailureSource>,
        event_bus: EventBus<ConversionEvent>,
    ) -> Self {
        let catalog = Arc::new(StageCatalog::standard());
        Self {
            eta: EtaEstimator::new(Arc::clone(&catalog)),
            catalog,
            executor,
            failures,
            classifier: ErrorClassifier::new(),
            finalizer: Arc::new(ResultFinalizer::new(Arc::new(MetadataMidiEncoder))),
            event_bus,
            state: Arc::new(RwLock::new(ControllerState::default())),
        }
    }

    /// Replace the stage catalog
    pub fn with_catalog(mut self, catalog: StageCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self.eta = EtaEstimator::new(Arc::clone(&self.catalog));
        self
    }

    /// Replace the MIDI encoder
    pub fn with_encoder(mut self, encoder: Arc<dyn MidiEncoder>) -> Self {
        self.finalizer = Arc::new(ResultFinalizer::new(encoder));
        self
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ConversionEvent> {
        self.event_bus.subscribe()
    }

    /// Start converting `document`
    ///
    /// Rejected while a non-terminal job exists. A terminal job is replaced.
    pub async fn submit(
        &self,
        document: Document,
        options: ProcessingOptions,
    ) -> Result<JobHandle, ControllerError> {
        if document.is_empty() {
            return Err(ControllerError::EmptyDocument);
        }
        options.validate().map_err(ControllerError::InvalidOptions)?;

        let estimated_total_ms = self.eta.total_estimate_ms(options.processing_mode);
        let job = Job::new(
            document.file_name.clone(),
            document.digest(),
            options.clone(),
            estimated_total_ms,
        );
        let job_id = job.job_id;
        let status = job.status;
        let cancel = CancellationToken::new();

        {
            let mut state = self.state.write().await;
            if let Some(active) = state.job.as_ref().filter(|job| job.status.is_running()) {
                return Err(ControllerError::JobActive {
                    job_id: active.job_id,
                    status: active.status,
                });
            }
            state.job = Some(job);
            state.cancel = Some(cancel.clone());
        }

        tracing::info!(
            job_id = %job_id,
            document = %document.file_name,
            bytes = document.len(),
            mode = %options.processing_mode,
            estimated_total_ms,
            "Conversion job accepted"
        );

        self.event_bus.emit_lossy(ConversionEvent::JobStarted {
            job_id,
            document_name: document.file_name.clone(),
            processing_mode: options.processing_mode,
            estimated_total_ms,
            timestamp: Utc::now(),
        });

        let runner = JobRunner {
            job_id,
            document: Arc::new(document),
            options,
            catalog: Arc::clone(&self.catalog),
            eta: self.eta.clone(),
            executor: Arc::clone(&self.executor),
            failures: Arc::clone(&self.failures),
            classifier: self.classifier,
            finalizer: Arc::clone(&self.finalizer),
            event_bus: self.event_bus.clone(),
            state: Arc::clone(&self.state),
            cancel,
        };

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = runner.run().await;
            // Receiver may have been dropped; the outcome is also stored on the job
            let _ = tx.send(outcome);
        });

        Ok(JobHandle {
            job_id,
            status,
            estimated_total_ms,
            outcome: rx,
        })
    }

    /// Current observable state
    pub async fn snapshot(&self) -> JobSnapshot {
        self.state
            .read()
            .await
            .job
            .as_ref()
            .map(Job::snapshot)
            .unwrap_or_else(JobSnapshot::idle)
    }

    /// Terminal outcome of the current job, if it has one
    pub async fn outcome(&self) -> Option<JobOutcome> {
        self.finished().await.map(|(_, outcome)| outcome)
    }

    /// Terminal status and outcome, read together
    pub async fn finished(&self) -> Option<(JobStatus, JobOutcome)> {
        let state = self.state.read().await;
        let job = state.job.as_ref()?;
        let outcome = match (job.status, &job.result, &job.error) {
            (_, Some(result), _) => JobOutcome::Completed(result.clone()),
            (_, _, Some(error)) => JobOutcome::Failed(error.clone()),
            (JobStatus::Cancelled, _, _) => JobOutcome::Cancelled,
            _ => return None,
        };
        Some((job.status, outcome))
    }

    /// Finished result of the current job
    pub async fn result(&self) -> Option<ProcessingResult> {
        self.state.read().await.job.as_ref()?.result.clone()
    }

    /// Cancel the running job
    ///
    /// The job becomes `cancelled` immediately with its progress frozen; the
    /// runner stops at its next suspension point.
    pub async fn cancel(&self) -> Result<JobSnapshot, ControllerError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let job = state
            .job
            .as_mut()
            .filter(|job| !job.is_terminal())
            .ok_or(ControllerError::NoActiveJob)?;
        if let Some(token) = state.cancel.as_ref() {
            token.cancel();
        }

        job.transition_to(JobStatus::Cancelled);
        tracing::info!(job_id = %job.job_id, progress = job.progress, "Conversion job cancelled");

        self.event_bus.emit_lossy(ConversionEvent::JobCancelled {
            job_id: job.job_id,
            progress: job.progress,
            timestamp: Utc::now(),
        });

        Ok(job.snapshot())
    }

    /// Discard the current job, in any state, and return to idle
    pub async fn reset(&self) -> JobSnapshot {
        let mut state = self.state.write().await;
        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        let discarded = state.job.take().map(|job| job.job_id);
        drop(state);

        tracing::info!(job_id = ?discarded, "Controller reset");

        self.event_bus.emit_lossy(ConversionEvent::JobReset {
            job_id: discarded,
            timestamp: Utc::now(),
        });

        JobSnapshot::idle()
    }
}
