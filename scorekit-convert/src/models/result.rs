//! Successful (or partially successful) conversion output

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::DetectedElements;

/// One MIDI track derived from the detected clefs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    pub name: String,
    pub instrument: String,
    pub clef: String,
    pub note_count: u32,
}

/// Descriptive metadata written into the MIDI file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MidiMetadata {
    pub title: String,
    pub composer: String,
    pub copyright: String,
    pub processing_date: DateTime<Utc>,
    /// Producing software and version, e.g. "scorekit-convert/0.1.0"
    pub software: String,
    pub tracks: Vec<TrackInfo>,
}

/// Terminal result of a `success` or `partial_success` job
///
/// Built once by the finalizer; there are no mutating methods.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    /// Output file name, e.g. "bach_prelude.mid"
    pub file_name: String,

    /// Encoded MIDI bytes (served separately, not part of JSON bodies)
    #[serde(skip_serializing)]
    pub midi_data: Vec<u8>,

    pub title: String,
    pub composer: String,
    pub processing_date: DateTime<Utc>,

    /// Overall confidence (0.0 - 1.0); exactly 0.65 on partial success
    pub confidence: f64,

    pub detected_elements: DetectedElements,
    pub metadata: MidiMetadata,

    /// Sections whose uncertainty made the job a partial success
    pub flagged_sections: Vec<String>,
}

impl ProcessingResult {
    pub fn midi_size_bytes(&self) -> usize {
        self.midi_data.len()
    }

    pub fn is_partial(&self) -> bool {
        !self.flagged_sections.is_empty()
    }
}
