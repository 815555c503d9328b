//! Injectable failure and partial-failure signals
//!
//! The controller asks the failure source after every stage whether the stage
//! failed, and once before finalizing which sections (if any) should be
//! flagged as uncertain. Production uses the random source at demonstration
//! rates; tests script every branch.

use rand::Rng;
use std::collections::HashMap;

use super::error_classifier::{FailureCause, FailureSignal};
use super::stage_catalog::Stage;
use crate::models::DetectedElements;

pub const DEFAULT_FAILURE_RATE: f64 = 0.10;
pub const DEFAULT_PARTIAL_RATE: f64 = 0.15;

/// Relative weights of the canonical causes for random failures
const CAUSE_WEIGHTS: [(FailureCause, u32); 3] = [
    (FailureCause::Blur, 40),
    (FailureCause::Notation, 35),
    (FailureCause::Handwritten, 25),
];

/// Source of injected stage failures and partial-success flags
pub trait FailureSource: Send + Sync {
    /// Failure raised after stage `index` of `stage_count` completed its work
    fn stage_failure(&self, index: usize, stage: &Stage, stage_count: usize) -> Option<FailureSignal>;

    /// Sections to flag as uncertain, given what was detected
    fn partial_sections(&self, elements: &DetectedElements) -> Vec<String>;
}

/// Never fails, never flags
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFailures;

impl FailureSource for NoFailures {
    fn stage_failure(&self, _: usize, _: &Stage, _: usize) -> Option<FailureSignal> {
        None
    }

    fn partial_sections(&self, _: &DetectedElements) -> Vec<String> {
        Vec::new()
    }
}

/// Random failures at configurable rates
///
/// The failure check fires once per job, at the last stage (just before
/// finalization). The failure cause is a weighted choice between blur,
/// notation and handwritten input; certainty is uniform in [0.1, 0.4].
#[derive(Debug, Clone)]
pub struct RandomFailureSource {
    failure_rate: f64,
    partial_rate: f64,
}

impl RandomFailureSource {
    pub fn new(failure_rate: f64, partial_rate: f64) -> Self {
        Self {
            failure_rate: sanitize_rate(failure_rate),
            partial_rate: sanitize_rate(partial_rate),
        }
    }
}

fn sanitize_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl Default for RandomFailureSource {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_RATE, DEFAULT_PARTIAL_RATE)
    }
}

impl FailureSource for RandomFailureSource {
    fn stage_failure(&self, index: usize, _stage: &Stage, stage_count: usize) -> Option<FailureSignal> {
        if index + 1 != stage_count {
            return None;
        }

        let mut rng = rand::thread_rng();
        if !rng.gen_bool(self.failure_rate) {
            return None;
        }

        let total: u32 = CAUSE_WEIGHTS.iter().map(|(_, w)| w).sum();
        let mut pick = rng.gen_range(0..total);
        let mut cause = FailureCause::Blur;
        for (candidate, weight) in CAUSE_WEIGHTS {
            if pick < weight {
                cause = candidate;
                break;
            }
            pick -= weight;
        }

        Some(FailureSignal::known(cause).with_certainty(rng.gen_range(0.1..=0.4)))
    }

    fn partial_sections(&self, elements: &DetectedElements) -> Vec<String> {
        let mut rng = rand::thread_rng();
        if !rng.gen_bool(self.partial_rate) {
            return Vec::new();
        }

        // Flag a four-measure span inside the recognized score
        let measures = elements.measures.unwrap_or(0).max(4);
        let start = rng.gen_range(1..=measures - 3);
        vec![format!("measures {}-{}", start, start + 3)]
    }
}

/// Deterministic failures for tests and demos
#[derive(Debug, Clone, Default)]
pub struct ScriptedFailureSource {
    failures: HashMap<usize, FailureSignal>,
    partial_sections: Vec<String>,
}

impl ScriptedFailureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the stage at `index` with `signal`
    pub fn fail_at(mut self, index: usize, signal: FailureSignal) -> Self {
        self.failures.insert(index, signal);
        self
    }

    /// Flag these sections at finalization
    pub fn with_partial_sections<S: Into<String>>(mut self, sections: impl IntoIterator<Item = S>) -> Self {
        self.partial_sections = sections.into_iter().map(Into::into).collect();
        self
    }
}

impl FailureSource for ScriptedFailureSource {
    fn stage_failure(&self, index: usize, _: &Stage, _: usize) -> Option<FailureSignal> {
        self.failures.get(&index).cloned()
    }

    fn partial_sections(&self, _: &DetectedElements) -> Vec<String> {
        self.partial_sections.clone()
    }
}
