//! Ordered processing stages with nominal cost and cumulative progress weight
//!
//! | # | phase      | label                                | ms   | weight |
//! |---|------------|--------------------------------------|------|--------|
//! | 0 | upload     | Uploading document                   |  800 |  10    |
//! | 1 | analysis   | Analyzing image quality              | 1000 |  20    |
//! | 2 | analysis   | Detecting staff lines                | 1200 |  30    |
//! | 3 | analysis   | Identifying clefs and key signature  | 1000 |  40    |
//! | 4 | processing | Recognizing notes                    | 2000 |  55    |
//! | 5 | processing | Detecting rhythm and tempo           | 1500 |  65    |
//! | 6 | processing | Reading dynamics and articulations   | 1200 |  75    |
//! | 7 | processing | Assembling measures                  | 1000 |  85    |
//! | 8 | generation | Generating MIDI                      | 1500 |  95    |
//! | 9 | generation | Finalizing output                    |  800 | 100    |

use serde::Serialize;

use crate::models::Phase;

pub const STAGE_UPLOAD: &str = "Uploading document";
pub const STAGE_IMAGE_QUALITY: &str = "Analyzing image quality";
pub const STAGE_STAFF_LINES: &str = "Detecting staff lines";
pub const STAGE_CLEFS_AND_KEY: &str = "Identifying clefs and key signature";
pub const STAGE_NOTES: &str = "Recognizing notes";
pub const STAGE_RHYTHM_AND_TEMPO: &str = "Detecting rhythm and tempo";
pub const STAGE_DYNAMICS: &str = "Reading dynamics and articulations";
pub const STAGE_MEASURES: &str = "Assembling measures";
pub const STAGE_GENERATE_MIDI: &str = "Generating MIDI";
pub const STAGE_FINALIZE: &str = "Finalizing output";

/// One discrete unit of pipeline work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub phase: Phase,
    pub label: &'static str,
    pub nominal_duration_ms: u64,
    /// Cumulative progress (0 - 100) once this stage completes
    pub progress_weight: u8,
}

impl Stage {
    pub const fn new(
        phase: Phase,
        label: &'static str,
        nominal_duration_ms: u64,
        progress_weight: u8,
    ) -> Self {
        Self {
            phase,
            label,
            nominal_duration_ms,
            progress_weight,
        }
    }
}

const STANDARD_STAGES: [Stage; 10] = [
    Stage::new(Phase::Upload, STAGE_UPLOAD, 800, 10),
    Stage::new(Phase::Analysis, STAGE_IMAGE_QUALITY, 1000, 20),
    Stage::new(Phase::Analysis, STAGE_STAFF_LINES, 1200, 30),
    Stage::new(Phase::Analysis, STAGE_CLEFS_AND_KEY, 1000, 40),
    Stage::new(Phase::Processing, STAGE_NOTES, 2000, 55),
    Stage::new(Phase::Processing, STAGE_RHYTHM_AND_TEMPO, 1500, 65),
    Stage::new(Phase::Processing, STAGE_DYNAMICS, 1200, 75),
    Stage::new(Phase::Processing, STAGE_MEASURES, 1000, 85),
    Stage::new(Phase::Generation, STAGE_GENERATE_MIDI, 1500, 95),
    Stage::new(Phase::Generation, STAGE_FINALIZE, 800, 100),
];

/// Immutable, ordered stage catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCatalog {
    stages: Vec<Stage>,
}

impl StageCatalog {
    /// The canonical 10-stage catalog
    pub fn standard() -> Self {
        Self {
            stages: STANDARD_STAGES.to_vec(),
        }
    }

    /// Build a custom catalog
    ///
    /// Requirements: at least one stage, positive durations, strictly
    /// increasing weights ending at exactly 100, phases in pipeline order.
    pub fn new(stages: Vec<Stage>) -> Result<Self, String> {
        let Some(last) = stages.last() else {
            return Err("stage catalog must contain at least one stage".to_string());
        };
        if last.progress_weight != 100 {
            return Err(format!(
                "last stage must reach progress 100, got {}",
                last.progress_weight
            ));
        }
        for (i, stage) in stages.iter().enumerate() {
            if stage.nominal_duration_ms == 0 {
                return Err(format!("stage {} ({}) has zero duration", i, stage.label));
            }
            if i > 0 {
                let prev = &stages[i - 1];
                if stage.progress_weight <= prev.progress_weight {
                    return Err(format!(
                        "stage {} ({}) weight {} does not exceed previous weight {}",
                        i, stage.label, stage.progress_weight, prev.progress_weight
                    ));
                }
                if phase_order(stage.phase) < phase_order(prev.phase) {
                    return Err(format!("stage {} ({}) is out of phase order", i, stage.label));
                }
            }
        }
        Ok(Self { stages })
    }

    /// Same ordered sequence on every call
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn get(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn phase_of(&self, index: usize) -> Option<Phase> {
        self.stages.get(index).map(|s| s.phase)
    }

    pub fn last_index(&self) -> usize {
        self.stages.len().saturating_sub(1)
    }

    pub fn total_nominal_duration_ms(&self) -> u64 {
        self.stages.iter().map(|s| s.nominal_duration_ms).sum()
    }

    /// Sum of nominal durations of stages `0..=index`
    pub fn cumulative_duration_ms(&self, index: usize) -> u64 {
        self.stages
            .iter()
            .take(index.saturating_add(1))
            .map(|s| s.nominal_duration_ms)
            .sum()
    }
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn phase_order(phase: Phase) -> u8 {
    match phase {
        Phase::Upload => 0,
        Phase::Analysis => 1,
        Phase::Processing => 2,
        Phase::Generation => 3,
    }
}
