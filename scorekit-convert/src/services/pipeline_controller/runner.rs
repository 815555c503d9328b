//! Per-job runner task
//!
//! Walks the catalog in order. For each stage: enter the stage (status follows
//! the stage's phase), run the executor raced against cancellation, check for
//! a failure, then publish progress, ETA and elements. The last stage also
//! finalizes, so progress reaches 100 together with the terminal status.
//!
//! Every write goes through `ControllerState::live_job`; once the job was
//! cancelled, reset or replaced, the runner stops without touching state.

use chrono::Utc;
use scorekit_common::EventBus;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::ControllerState;
use crate::events::ConversionEvent;
use crate::executors::{StageContext, StageExecutor, StageOutcome};
use crate::models::{
    DetectedElements, Document, Job, JobOutcome, JobStatus, ProcessingError, ProcessingOptions,
};
use crate::services::result_finalizer::preference_overrides;
use crate::services::stage_catalog::STAGE_GENERATE_MIDI;
use crate::services::{
    ErrorClassifier, EtaEstimator, FailureCause, FailureSignal, FailureSource, ResultFinalizer,
    Stage, StageCatalog,
};

pub(super) struct JobRunner {
    pub(super) job_id: Uuid,
    pub(super) document: Arc<Document>,
    pub(super) options: ProcessingOptions,
    pub(super) catalog: Arc<StageCatalog>,
    pub(super) eta: EtaEstimator,
    pub(super) executor: Arc<dyn StageExecutor>,
    pub(super) failures: Arc<dyn FailureSource>,
    pub(super) classifier: ErrorClassifier,
    pub(super) finalizer: Arc<ResultFinalizer>,
    pub(super) event_bus: EventBus<ConversionEvent>,
    pub(super) state: Arc<RwLock<ControllerState>>,
    pub(super) cancel: CancellationToken,
}

impl JobRunner {
    pub(super) async fn run(self) -> JobOutcome {
        let catalog = Arc::clone(&self.catalog);
        let Some((last, leading)) = catalog.stages().split_last() else {
            let signal = FailureSignal::message("Stage catalog is empty");
            return self.fail(&signal, None).await;
        };

        for (index, stage) in leading.iter().enumerate() {
            let elements = match self.run_stage(index, stage).await {
                Ok(elements) => elements,
                Err(outcome) => return outcome,
            };
            if !self.publish_stage(index, stage, elements).await {
                return self.stop_cancelled().await;
            }
        }

        let last_index = leading.len();
        match self.run_stage(last_index, last).await {
            Ok(elements) => self.finish(last_index, last, elements).await,
            Err(outcome) => outcome,
        }
    }

    /// Execute one stage; `Err` carries the outcome that ends the job early
    async fn run_stage(
        &self,
        index: usize,
        stage: &Stage,
    ) -> Result<Option<DetectedElements>, JobOutcome> {
        if self.cancel.is_cancelled() || !self.begin_stage(index, stage).await {
            return Err(self.stop_cancelled().await);
        }

        let ctx = StageContext {
            job_id: self.job_id,
            stage_index: index,
            stage: stage.clone(),
            estimated_duration_ms: self
                .eta
                .stage_estimate_ms(self.options.processing_mode, index),
            document: Arc::clone(&self.document),
            options: self.options.clone(),
        };

        let executed = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(self.stop_cancelled().await),
            executed = self.executor.execute(&ctx) => executed,
        };

        let outcome = executed.unwrap_or_else(|e| {
            tracing::warn!(
                job_id = %self.job_id,
                stage = stage.label,
                executor = self.executor.name(),
                error = %e,
                "Stage executor failed"
            );
            StageOutcome::failed(FailureSignal::message(format!("{:#}", e)))
        });

        let failure = outcome
            .failure
            .or_else(|| self.failures.stage_failure(index, stage, self.catalog.len()));
        if let Some(signal) = failure {
            return Err(self.fail(&signal, Some(stage.label)).await);
        }

        Ok(outcome.elements)
    }

    /// Enter a stage; false if the job is no longer live
    async fn begin_stage(&self, index: usize, stage: &Stage) -> bool {
        let mut state = self.state.write().await;
        let Some(job) = state.live_job(self.job_id) else {
            return false;
        };

        let status = stage.phase.status();
        if job.status != status {
            if let Some(transition) = job.transition_to(status) {
                tracing::debug!(
                    job_id = %self.job_id,
                    from = ?transition.old_status,
                    to = ?transition.new_status,
                    "Job status changed"
                );
            }
        }
        job.begin_stage(index, stage.label);

        tracing::debug!(job_id = %self.job_id, index, stage = stage.label, "Stage started");
        true
    }

    /// Merge elements and publish progress for a non-final stage
    async fn publish_stage(
        &self,
        index: usize,
        stage: &Stage,
        elements: Option<DetectedElements>,
    ) -> bool {
        let mut state = self.state.write().await;
        let Some(job) = state.live_job(self.job_id) else {
            return false;
        };

        if let Some(elements) = elements {
            job.elements.merge(elements);
        }
        let remaining = self.eta.remaining_ms(self.options.processing_mode, index);
        job.complete_stage(stage.progress_weight, remaining);

        tracing::debug!(
            job_id = %self.job_id,
            stage = stage.label,
            progress = job.progress,
            remaining_ms = remaining,
            "Stage completed"
        );
        self.emit_stage_completed(job, index, stage);
        true
    }

    /// Finalize after the last stage and publish the terminal state
    async fn finish(
        &self,
        index: usize,
        stage: &Stage,
        elements: Option<DetectedElements>,
    ) -> JobOutcome {
        let mut state = self.state.write().await;
        let Some(job) = state.live_job(self.job_id) else {
            return JobOutcome::Cancelled;
        };

        if let Some(elements) = elements {
            job.elements.merge(elements);
        }
        let preferences = preference_overrides(&self.options);
        if !preferences.is_empty() {
            job.elements.merge(preferences);
        }

        let flagged = self.failures.partial_sections(job.elements.elements());
        let finalized = self.finalizer.finalize(
            &self.document.file_name,
            self.document.stem(),
            &self.options,
            &job.elements,
            flagged,
        );

        let finalization = match finalized {
            Ok(finalization) => finalization,
            Err(e) => {
                let signal = FailureSignal::known(FailureCause::Format).with_detail(e.to_string());
                let error = self.classifier.classify(&signal, Some(STAGE_GENERATE_MIDI));
                self.record_failure(job, &error);
                return JobOutcome::Failed(error);
            }
        };

        let remaining = self.eta.remaining_ms(self.options.processing_mode, index);
        job.complete_stage(stage.progress_weight, remaining);
        job.transition_to(finalization.status);
        job.result = Some(finalization.result.clone());

        self.emit_stage_completed(job, index, stage);

        let result = finalization.result;
        tracing::info!(
            job_id = %self.job_id,
            status = ?finalization.status,
            title = %result.title,
            composer = %result.composer,
            confidence = result.confidence,
            flagged = result.flagged_sections.len(),
            "Conversion finished"
        );

        self.event_bus.emit_lossy(ConversionEvent::JobSucceeded {
            job_id: self.job_id,
            status: finalization.status,
            file_name: result.file_name.clone(),
            title: result.title.clone(),
            composer: result.composer.clone(),
            confidence: result.confidence,
            tracks: result.metadata.tracks.clone(),
            flagged_sections: result.flagged_sections.clone(),
            midi_size_bytes: result.midi_size_bytes(),
            timestamp: Utc::now(),
        });

        JobOutcome::Completed(result)
    }

    /// Classify and record a stage failure
    async fn fail(&self, signal: &FailureSignal, stage_label: Option<&str>) -> JobOutcome {
        let error = self.classifier.classify(signal, stage_label);

        let mut state = self.state.write().await;
        match state.live_job(self.job_id) {
            Some(job) => {
                self.record_failure(job, &error);
                JobOutcome::Failed(error)
            }
            None => JobOutcome::Cancelled,
        }
    }

    fn record_failure(&self, job: &mut Job, error: &ProcessingError) {
        job.error = Some(error.clone());
        job.transition_to(JobStatus::Error);

        tracing::error!(
            job_id = %self.job_id,
            kind = %error.kind,
            stage = ?error.stage_label,
            confidence = error.confidence,
            detail = ?error.detail,
            "Conversion failed"
        );

        self.event_bus.emit_lossy(ConversionEvent::JobFailed {
            job_id: self.job_id,
            progress: job.progress,
            error: error.clone(),
            timestamp: Utc::now(),
        });
    }

    /// Stop after the token fired or the job disappeared
    async fn stop_cancelled(&self) -> JobOutcome {
        let mut state = self.state.write().await;
        if let Some(job) = state.live_job(self.job_id) {
            job.transition_to(JobStatus::Cancelled);
            self.event_bus.emit_lossy(ConversionEvent::JobCancelled {
                job_id: self.job_id,
                progress: job.progress,
                timestamp: Utc::now(),
            });
        }

        tracing::debug!(job_id = %self.job_id, "Runner stopped");
        JobOutcome::Cancelled
    }

    fn emit_stage_completed(&self, job: &Job, index: usize, stage: &Stage) {
        self.event_bus.emit_lossy(ConversionEvent::StageCompleted {
            job_id: self.job_id,
            status: job.status,
            progress: job.progress,
            stage_index: index,
            current_stage_label: stage.label.to_string(),
            estimated_remaining_ms: job.estimated_remaining_ms,
            detected_elements: job.elements.snapshot(),
            timestamp: Utc::now(),
        });
    }
}
