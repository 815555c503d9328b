//! Musical elements detected while a job runs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Clef names with a track mapping at finalization
pub const CLEF_TREBLE: &str = "Treble";
pub const CLEF_BASS: &str = "Bass";

/// Structural summary of the recognized music
///
/// Every field is optional: a stage fills in what it found, and the same type
/// doubles as the partial update a stage contributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedElements {
    /// e.g. "4/4"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<String>,

    /// e.g. "C major"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_signature: Option<String>,

    /// Beats per minute (positive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<u32>,

    /// e.g. "Allegro"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo_marking: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clefs: Option<BTreeSet<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measures: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamics: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub articulations: Option<Vec<String>>,
}

impl DetectedElements {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_clef(&self, clef: &str) -> bool {
        self.clefs.as_ref().is_some_and(|clefs| clefs.contains(clef))
    }

    /// Clef set from string slices
    pub fn clef_set<'a>(clefs: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
        clefs.into_iter().map(str::to_string).collect()
    }
}
