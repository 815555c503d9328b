//! Total and remaining time estimates
//!
//! Estimates are derived from nominal stage durations scaled by the
//! processing mode's multiplier, not from observed timings, so they are
//! deterministic and reach exactly zero at the final stage.

use std::sync::Arc;

use super::StageCatalog;
use crate::models::ProcessingMode;

#[derive(Debug, Clone)]
pub struct EtaEstimator {
    catalog: Arc<StageCatalog>,
}

impl EtaEstimator {
    pub fn new(catalog: Arc<StageCatalog>) -> Self {
        Self { catalog }
    }

    /// Total nominal duration scaled by the mode multiplier
    pub fn total_estimate_ms(&self, mode: ProcessingMode) -> u64 {
        scale(self.catalog.total_nominal_duration_ms(), mode)
    }

    /// Estimated time left once stage `completed_stage_index` has finished
    ///
    /// Strictly decreasing in the index; 0 at (and past) the last stage.
    pub fn remaining_ms(&self, mode: ProcessingMode, completed_stage_index: usize) -> u64 {
        let completed = scale(
            self.catalog.cumulative_duration_ms(completed_stage_index),
            mode,
        );
        self.total_estimate_ms(mode).saturating_sub(completed)
    }

    /// Scaled duration of a single stage, handed to the executor with its context
    pub fn stage_estimate_ms(&self, mode: ProcessingMode, stage_index: usize) -> u64 {
        self.catalog
            .get(stage_index)
            .map(|s| scale(s.nominal_duration_ms, mode))
            .unwrap_or(0)
    }
}

fn scale(ms: u64, mode: ProcessingMode) -> u64 {
    (ms as f64 * mode.time_multiplier()).round() as u64
}
