//! Timer-based recognizer
//!
//! Paces each stage by its nominal duration (scaled by the processing mode and
//! a configurable time scale) and reports a fixed set of elements for a
//! typical piano score. The upload stage checks the document's magic bytes
//! and rejects anything that is not a PDF or a raster image.

use std::time::Duration;

use super::{StageContext, StageExecutor, StageOutcome};
use crate::models::elements::{CLEF_BASS, CLEF_TREBLE};
use crate::models::DetectedElements;
use crate::services::stage_catalog::{
    STAGE_CLEFS_AND_KEY, STAGE_DYNAMICS, STAGE_MEASURES, STAGE_NOTES, STAGE_RHYTHM_AND_TEMPO,
    STAGE_UPLOAD,
};
use crate::services::{FailureCause, FailureSignal};

/// MIME types accepted at upload
pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/tiff",
    "image/bmp",
    "image/gif",
    "image/webp",
];

#[derive(Debug, Clone)]
pub struct SimulatedRecognizer {
    /// Multiplier on stage durations; 0 runs without delay
    time_scale: f64,
}

impl SimulatedRecognizer {
    pub fn new(time_scale: f64) -> Self {
        let time_scale = if time_scale.is_finite() { time_scale.max(0.0) } else { 1.0 };
        Self { time_scale }
    }

    /// No delays, for tests
    pub fn instant() -> Self {
        Self::new(0.0)
    }

    fn stage_delay(&self, ctx: &StageContext) -> Duration {
        let ms = ctx.estimated_duration_ms as f64 * self.time_scale;
        Duration::from_millis(ms.round() as u64)
    }

    fn check_format(ctx: &StageContext) -> Option<FailureSignal> {
        match ctx.document.sniff_mime_type() {
            Some(mime) if ACCEPTED_MIME_TYPES.contains(&mime) => {
                tracing::debug!(job_id = %ctx.job_id, mime, "Document format accepted");
                None
            }
            Some(mime) => Some(
                FailureSignal::known(FailureCause::Format)
                    .with_detail(format!("unsupported format: {}", mime)),
            ),
            None => Some(
                FailureSignal::known(FailureCause::Format)
                    .with_detail("unrecognized file content"),
            ),
        }
    }
}

impl Default for SimulatedRecognizer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Canned elements reported by the stage with the given label
fn elements_for_stage(label: &str) -> Option<DetectedElements> {
    let elements = match label {
        STAGE_CLEFS_AND_KEY => DetectedElements {
            clefs: Some(DetectedElements::clef_set([CLEF_TREBLE, CLEF_BASS])),
            key_signature: Some("C major".to_string()),
            time_signature: Some("4/4".to_string()),
            ..Default::default()
        },
        STAGE_NOTES => DetectedElements {
            note_count: Some(256),
            ..Default::default()
        },
        STAGE_RHYTHM_AND_TEMPO => DetectedElements {
            tempo: Some(120),
            tempo_marking: Some("Allegro".to_string()),
            ..Default::default()
        },
        STAGE_DYNAMICS => DetectedElements {
            dynamics: Some(vec!["p".to_string(), "mf".to_string(), "f".to_string()]),
            articulations: Some(vec![
                "staccato".to_string(),
                "legato".to_string(),
                "accent".to_string(),
            ]),
            ..Default::default()
        },
        STAGE_MEASURES => DetectedElements {
            measures: Some(32),
            ..Default::default()
        },
        _ => return None,
    };
    Some(elements)
}

#[async_trait::async_trait]
impl StageExecutor for SimulatedRecognizer {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn execute(&self, ctx: &StageContext) -> anyhow::Result<StageOutcome> {
        let delay = self.stage_delay(ctx);
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }

        if ctx.stage.label == STAGE_UPLOAD {
            if let Some(signal) = Self::check_format(ctx) {
                return Ok(StageOutcome::failed(signal));
            }
        }

        Ok(elements_for_stage(ctx.stage.label)
            .map(StageOutcome::with_elements)
            .unwrap_or_default())
    }
}
