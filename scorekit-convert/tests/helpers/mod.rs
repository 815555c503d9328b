//! Test Helper Utilities
//!
//! Shared fixtures for scorekit-convert integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use scorekit_common::EventBus;
use scorekit_convert::events::ConversionEvent;
use scorekit_convert::executors::{SimulatedRecognizer, StageContext, StageExecutor, StageOutcome};
use scorekit_convert::models::{Document, JobOutcome};
use scorekit_convert::services::{FailureSource, NoFailures, PipelineController, JobHandle};
use tokio::sync::broadcast;

/// Smallest byte string the format sniffer accepts as a PDF
pub const PDF_BYTES: &[u8] = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<<>>\nendobj\n";

pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

pub fn pdf(name: &str) -> Document {
    Document::new(name, PDF_BYTES.to_vec())
}

/// Controller with the instant simulated recognizer
pub fn controller(failures: Arc<dyn FailureSource>) -> PipelineController {
    controller_with(Arc::new(SimulatedRecognizer::instant()), failures)
}

pub fn controller_with(
    executor: Arc<dyn StageExecutor>,
    failures: Arc<dyn FailureSource>,
) -> PipelineController {
    PipelineController::new(executor, failures, EventBus::new(256))
}

pub fn reliable_controller() -> PipelineController {
    controller(Arc::new(NoFailures))
}

/// Wait for a job's outcome, failing the test if it hangs
pub async fn wait(handle: JobHandle) -> JobOutcome {
    tokio::time::timeout(WAIT_LIMIT, handle.wait())
        .await
        .expect("job did not finish in time")
}

/// Receive events until (and including) the first terminal one
pub async fn collect_until_terminal(
    rx: &mut broadcast::Receiver<ConversionEvent>,
) -> Vec<ConversionEvent> {
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(WAIT_LIMIT, rx.recv())
            .await
            .expect("no terminal event in time")
            .expect("event bus closed");
        let terminal = event.is_terminal();
        events.push(event);
        if terminal {
            return events;
        }
    }
}

/// Receive events until the stage at `index` has completed
pub async fn wait_for_stage(rx: &mut broadcast::Receiver<ConversionEvent>, index: usize) {
    loop {
        let event = tokio::time::timeout(WAIT_LIMIT, rx.recv())
            .await
            .expect("stage did not complete in time")
            .expect("event bus closed");
        if let ConversionEvent::StageCompleted { stage_index, .. } = event {
            if stage_index == index {
                return;
            }
        }
    }
}

/// Runs stages instantly but never returns from the stage at `stall_at`
pub struct StallingExecutor {
    pub stall_at: usize,
    inner: SimulatedRecognizer,
}

impl StallingExecutor {
    pub fn new(stall_at: usize) -> Self {
        Self {
            stall_at,
            inner: SimulatedRecognizer::instant(),
        }
    }
}

#[async_trait::async_trait]
impl StageExecutor for StallingExecutor {
    fn name(&self) -> &'static str {
        "stalling"
    }

    async fn execute(&self, ctx: &StageContext) -> anyhow::Result<StageOutcome> {
        if ctx.stage_index == self.stall_at {
            std::future::pending::<()>().await;
        }
        self.inner.execute(ctx).await
    }
}

/// Fails the stage at `fail_at` with a transport-style error
pub struct ErroringExecutor {
    pub fail_at: usize,
    pub message: &'static str,
    inner: SimulatedRecognizer,
}

impl ErroringExecutor {
    pub fn new(fail_at: usize, message: &'static str) -> Self {
        Self {
            fail_at,
            message,
            inner: SimulatedRecognizer::instant(),
        }
    }
}

#[async_trait::async_trait]
impl StageExecutor for ErroringExecutor {
    fn name(&self) -> &'static str {
        "erroring"
    }

    async fn execute(&self, ctx: &StageContext) -> anyhow::Result<StageOutcome> {
        if ctx.stage_index == self.fail_at {
            anyhow::bail!("{}", self.message);
        }
        self.inner.execute(ctx).await
    }
}
