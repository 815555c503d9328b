//! Finalization: title, tracks, terminal status and the immutable result
//!
//! Runs once, after every stage completed without a classified failure.
//! Partial success is correlated with concrete sections: the ones the failure
//! source flagged, plus any element field no stage managed to detect.

use chrono::Utc;
use std::sync::Arc;

use super::midi_encoder::{EncodeError, MidiEncoder};
use super::title_recognizer::TitleRecognizer;
use super::ElementAccumulator;
use crate::models::elements::{CLEF_BASS, CLEF_TREBLE};
use crate::models::{
    DetectedElements, JobStatus, MidiMetadata, ProcessingOptions, ProcessingResult, TrackInfo,
};

/// Confidence of every partial success, regardless of recognition
pub const PARTIAL_SUCCESS_CONFIDENCE: f64 = 0.65;

/// Software tag written into results and MIDI files
pub const SOFTWARE_TAG: &str = concat!("scorekit-convert/", env!("CARGO_PKG_VERSION"));

const INSTRUMENT: &str = "Acoustic Grand Piano";

/// Terminal status plus the result it carries
#[derive(Debug, Clone)]
pub struct Finalization {
    pub status: JobStatus,
    pub result: ProcessingResult,
}

/// Tracks from the detected clefs
///
/// Treble is always emitted with 60 % of the notes; a detected Bass clef adds
/// a track with 40 %. Counts are floor-divided. Other clefs have no track.
pub fn derive_tracks(elements: &DetectedElements) -> Vec<TrackInfo> {
    let note_count = elements.note_count.unwrap_or(0);
    let share = |percent: u64| (u64::from(note_count) * percent / 100) as u32;

    let mut tracks = vec![TrackInfo {
        name: "Treble".to_string(),
        instrument: INSTRUMENT.to_string(),
        clef: CLEF_TREBLE.to_string(),
        note_count: share(60),
    }];

    if elements.has_clef(CLEF_BASS) {
        tracks.push(TrackInfo {
            name: "Bass".to_string(),
            instrument: INSTRUMENT.to_string(),
            clef: CLEF_BASS.to_string(),
            note_count: share(40),
        });
    }

    tracks
}

/// User preferences as a final element update
pub fn preference_overrides(options: &ProcessingOptions) -> DetectedElements {
    DetectedElements {
        tempo: options.preferred_tempo.filter(|t| *t > 0),
        key_signature: options
            .preferred_key
            .as_ref()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()),
        ..Default::default()
    }
}

pub struct ResultFinalizer {
    title_recognizer: TitleRecognizer,
    encoder: Arc<dyn MidiEncoder>,
}

impl ResultFinalizer {
    pub fn new(encoder: Arc<dyn MidiEncoder>) -> Self {
        Self {
            title_recognizer: TitleRecognizer::new(),
            encoder,
        }
    }

    /// Build the terminal result
    ///
    /// `flagged_sections` are the sections an external signal marked as
    /// uncertain; undetected fields are appended to them.
    pub fn finalize(
        &self,
        document_name: &str,
        output_stem: &str,
        options: &ProcessingOptions,
        elements: &ElementAccumulator,
        mut flagged_sections: Vec<String>,
    ) -> Result<Finalization, EncodeError> {
        let identification = self.title_recognizer.recognize(document_name);
        let detected = elements.snapshot();

        flagged_sections.extend(
            elements
                .missing_fields()
                .into_iter()
                .map(|field| format!("{} not detected", field)),
        );

        let (status, confidence) = if flagged_sections.is_empty() {
            (JobStatus::Success, identification.confidence.clamp(0.0, 1.0))
        } else {
            (JobStatus::PartialSuccess, PARTIAL_SUCCESS_CONFIDENCE)
        };

        let processing_date = Utc::now();
        let metadata = MidiMetadata {
            title: identification.title.clone(),
            composer: identification.composer.clone(),
            copyright: identification.copyright,
            processing_date,
            software: SOFTWARE_TAG.to_string(),
            tracks: derive_tracks(&detected),
        };

        let midi_data = self.encoder.encode(&metadata, &detected, options)?;

        tracing::debug!(
            status = ?status,
            confidence,
            tracks = metadata.tracks.len(),
            midi_bytes = midi_data.len(),
            "Conversion finalized"
        );

        Ok(Finalization {
            status,
            result: ProcessingResult {
                file_name: format!("{}.mid", output_stem),
                midi_data,
                title: identification.title,
                composer: identification.composer,
                processing_date,
                confidence,
                detected_elements: detected,
                metadata,
                flagged_sections,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::midi_encoder::MetadataMidiEncoder;

    fn complete_elements(clefs: &[&str], note_count: u32) -> ElementAccumulator {
        let mut acc = ElementAccumulator::new();
        acc.merge(DetectedElements {
            time_signature: Some("4/4".to_string()),
            key_signature: Some("C major".to_string()),
            tempo: Some(120),
            clefs: Some(DetectedElements::clef_set(clefs.iter().copied())),
            note_count: Some(note_count),
            measures: Some(16),
            ..Default::default()
        });
        acc
    }

    fn finalizer() -> ResultFinalizer {
        ResultFinalizer::new(Arc::new(MetadataMidiEncoder))
    }

    #[test]
    fn test_treble_only_yields_one_track() {
        let acc = complete_elements(&["Treble"], 101);
        let tracks = derive_tracks(acc.elements());
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].clef, "Treble");
        assert_eq!(tracks[0].note_count, 60);
    }

    #[test]
    fn test_bass_adds_second_track() {
        let acc = complete_elements(&["Treble", "Bass"], 101);
        let tracks = derive_tracks(acc.elements());
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].clef, "Bass");
        assert_eq!(tracks[1].note_count, 40);
    }

    #[test]
    fn test_unnamed_clef_dropped() {
        let acc = complete_elements(&["Alto"], 10);
        let tracks = derive_tracks(acc.elements());
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].clef, "Treble");
    }

    #[test]
    fn test_success_uses_recognized_confidence() {
        let acc = complete_elements(&["Treble", "Bass"], 200);
        let done = finalizer()
            .finalize("bach.pdf", "bach", &ProcessingOptions::default(), &acc, vec![])
            .unwrap();
        assert_eq!(done.status, JobStatus::Success);
        assert_eq!(done.result.composer, "Johann Sebastian Bach");
        assert!((done.result.confidence - 0.90).abs() < 1e-9);
        assert_eq!(done.result.file_name, "bach.mid");
        assert!(!done.result.midi_data.is_empty());
        assert!(done.result.flagged_sections.is_empty());
    }

    #[test]
    fn test_flagged_sections_force_partial_confidence() {
        let acc = complete_elements(&["Treble"], 200);
        let done = finalizer()
            .finalize(
                "bach.pdf",
                "bach",
                &ProcessingOptions::default(),
                &acc,
                vec!["measures 5-8".to_string()],
            )
            .unwrap();
        assert_eq!(done.status, JobStatus::PartialSuccess);
        assert_eq!(done.result.confidence, PARTIAL_SUCCESS_CONFIDENCE);
        assert!(done.result.is_partial());
    }

    #[test]
    fn test_missing_fields_are_flagged() {
        let mut acc = ElementAccumulator::new();
        acc.merge(DetectedElements {
            note_count: Some(10),
            ..Default::default()
        });
        let done = finalizer()
            .finalize("scan.png", "scan", &ProcessingOptions::default(), &acc, vec![])
            .unwrap();
        assert_eq!(done.status, JobStatus::PartialSuccess);
        assert!(done
            .result
            .flagged_sections
            .contains(&"tempo not detected".to_string()));
        assert_eq!(done.result.title, "Sheet Music");
        assert_eq!(done.result.composer, "Unknown");
    }

    #[test]
    fn test_preference_overrides() {
        let options = ProcessingOptions {
            preferred_tempo: Some(90),
            preferred_key: Some(" G minor ".to_string()),
            ..Default::default()
        };
        let overrides = preference_overrides(&options);
        assert_eq!(overrides.tempo, Some(90));
        assert_eq!(overrides.key_signature.as_deref(), Some("G minor"));
        assert!(preference_overrides(&ProcessingOptions::default()).is_empty());
    }
}
