//! Processing options supplied with a submission

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Processing mode; slower modes trade time for accuracy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    #[default]
    Standard,
    Enhanced,
    ManualAssist,
}

impl ProcessingMode {
    /// Time multiplier applied to every stage's nominal duration
    pub fn time_multiplier(self) -> f64 {
        match self {
            ProcessingMode::Standard => 1.0,
            ProcessingMode::Enhanced => 1.5,
            ProcessingMode::ManualAssist => 2.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingMode::Standard => "standard",
            ProcessingMode::Enhanced => "enhanced",
            ProcessingMode::ManualAssist => "manual_assist",
        }
    }
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for one conversion job. Immutable once the job starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    #[serde(default)]
    pub processing_mode: ProcessingMode,

    /// Tempo (bpm) to use instead of the recognized one
    #[serde(default)]
    pub preferred_tempo: Option<u32>,

    /// Key to use instead of the recognized one, e.g. "D minor"
    #[serde(default)]
    pub preferred_key: Option<String>,

    /// Zero-based page indices to convert; `None` converts every page
    #[serde(default)]
    pub selected_pages: Option<BTreeSet<u32>>,

    #[serde(default)]
    pub include_chords: bool,

    #[serde(default)]
    pub include_lyrics: bool,

    /// Write one MIDI track per staff instead of a single merged track
    #[serde(default)]
    pub separate_tracks: bool,
}

impl ProcessingOptions {
    /// Check option values that serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.preferred_tempo == Some(0) {
            return Err("preferred_tempo must be a positive integer".to_string());
        }
        if let Some(key) = &self.preferred_key {
            if key.trim().is_empty() {
                return Err("preferred_key must not be blank".to_string());
            }
        }
        if let Some(pages) = &self.selected_pages {
            if pages.is_empty() {
                return Err("selected_pages must name at least one page".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_multipliers() {
        assert_eq!(ProcessingMode::Standard.time_multiplier(), 1.0);
        assert_eq!(ProcessingMode::Enhanced.time_multiplier(), 1.5);
        assert_eq!(ProcessingMode::ManualAssist.time_multiplier(), 2.0);
    }

    #[test]
    fn test_deserialize_defaults() {
        let options: ProcessingOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ProcessingOptions::default());
        assert_eq!(options.processing_mode, ProcessingMode::Standard);
    }

    #[test]
    fn test_deserialize_mode() {
        let options: ProcessingOptions =
            serde_json::from_str(r#"{"processing_mode": "manual_assist", "preferred_tempo": 90}"#)
                .unwrap();
        assert_eq!(options.processing_mode, ProcessingMode::ManualAssist);
        assert_eq!(options.preferred_tempo, Some(90));
    }

    #[test]
    fn test_validate() {
        assert!(ProcessingOptions::default().validate().is_ok());

        let zero_tempo = ProcessingOptions {
            preferred_tempo: Some(0),
            ..Default::default()
        };
        assert!(zero_tempo.validate().is_err());

        let blank_key = ProcessingOptions {
            preferred_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank_key.validate().is_err());

        let no_pages = ProcessingOptions {
            selected_pages: Some(BTreeSet::new()),
            ..Default::default()
        };
        assert!(no_pages.validate().is_err());
    }
}
