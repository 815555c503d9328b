//! MIDI encoding of the finalized conversion
//!
//! Note-level synthesis belongs to an external encoder. The built-in
//! `MetadataMidiEncoder` writes a Standard MIDI File carrying only structure:
//! title, copyright, tempo, time and key signature, and one named track per
//! derived staff.

use midly::num::u24;
use midly::{Format, Header, MetaMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use thiserror::Error;

use crate::models::{DetectedElements, MidiMetadata, ProcessingOptions};

/// Pulses per quarter note
const PPQ: u16 = 480;
const DEFAULT_BPM: u32 = 120;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("MIDI write failed: {0}")]
    Write(String),

    #[error("Invalid element value: {0}")]
    InvalidElement(String),
}

/// Produces MIDI bytes for a finalized conversion
pub trait MidiEncoder: Send + Sync {
    fn encode(
        &self,
        metadata: &MidiMetadata,
        elements: &DetectedElements,
        options: &ProcessingOptions,
    ) -> Result<Vec<u8>, EncodeError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataMidiEncoder;

impl MidiEncoder for MetadataMidiEncoder {
    fn encode(
        &self,
        metadata: &MidiMetadata,
        elements: &DetectedElements,
        options: &ProcessingOptions,
    ) -> Result<Vec<u8>, EncodeError> {
        let bpm = elements.tempo.unwrap_or(DEFAULT_BPM);
        if bpm == 0 {
            return Err(EncodeError::InvalidElement("tempo must be positive".to_string()));
        }
        let time_signature = elements.time_signature.as_deref().and_then(parse_time_signature);
        let key_signature = elements.key_signature.as_deref().and_then(parse_key_signature);

        // Track 0: conductor track with global meta events
        let mut conductor = Track::new();
        push_meta(&mut conductor, MetaMessage::TrackName(metadata.title.as_bytes()));
        push_meta(&mut conductor, MetaMessage::Copyright(metadata.copyright.as_bytes()));
        push_meta(&mut conductor, MetaMessage::Text(metadata.software.as_bytes()));
        push_meta(&mut conductor, MetaMessage::Tempo(tempo_us_per_quarter(bpm).into()));
        if let Some((numerator, denominator_pow)) = time_signature {
            push_meta(
                &mut conductor,
                MetaMessage::TimeSignature(numerator, denominator_pow, 24, 8),
            );
        }
        if let Some((sharps, minor)) = key_signature {
            push_meta(&mut conductor, MetaMessage::KeySignature(sharps, minor));
        }

        let (format, tracks) = if options.separate_tracks && !metadata.tracks.is_empty() {
            push_meta(&mut conductor, MetaMessage::EndOfTrack);
            let mut tracks = vec![conductor];
            for info in &metadata.tracks {
                let mut track = Track::new();
                push_meta(&mut track, MetaMessage::TrackName(info.name.as_bytes()));
                push_meta(&mut track, MetaMessage::InstrumentName(info.instrument.as_bytes()));
                push_meta(&mut track, MetaMessage::EndOfTrack);
                tracks.push(track);
            }
            (Format::Parallel, tracks)
        } else {
            if let Some(first) = metadata.tracks.first() {
                push_meta(&mut conductor, MetaMessage::InstrumentName(first.instrument.as_bytes()));
            }
            push_meta(&mut conductor, MetaMessage::EndOfTrack);
            (Format::SingleTrack, vec![conductor])
        };

        let smf = Smf {
            header: Header {
                format,
                timing: Timing::Metrical(PPQ.into()),
            },
            tracks,
        };

        let mut bytes = Vec::new();
        smf.write(&mut bytes)
            .map_err(|e| EncodeError::Write(e.to_string()))?;
        Ok(bytes)
    }
}

fn push_meta<'a>(track: &mut Track<'a>, message: MetaMessage<'a>) {
    track.push(TrackEvent {
        delta: 0u32.into(),
        kind: TrackEventKind::Meta(message),
    });
}

/// Microseconds per quarter note, clamped to the 24-bit tempo field
///
/// Anything slower than about 3.6 bpm saturates at the slowest writable tempo.
fn tempo_us_per_quarter(bpm: u32) -> u32 {
    (60_000_000 / bpm).min(u24::max_value().as_int())
}

/// "6/8" → (6, 3): numerator and power-of-two denominator
fn parse_time_signature(value: &str) -> Option<(u8, u8)> {
    let (numerator, denominator) = value.trim().split_once('/')?;
    let numerator: u8 = numerator.trim().parse().ok().filter(|n| *n > 0)?;
    let denominator: u8 = denominator.trim().parse().ok()?;
    if !denominator.is_power_of_two() {
        return None;
    }
    Some((numerator, denominator.trailing_zeros() as u8))
}

const MAJOR_KEYS: [(&str, i8); 15] = [
    ("Cb", -7), ("Gb", -6), ("Db", -5), ("Ab", -4), ("Eb", -3), ("Bb", -2), ("F", -1),
    ("C", 0), ("G", 1), ("D", 2), ("A", 3), ("E", 4), ("B", 5), ("F#", 6), ("C#", 7),
];

const MINOR_KEYS: [(&str, i8); 15] = [
    ("Ab", -7), ("Eb", -6), ("Bb", -5), ("F", -4), ("C", -3), ("G", -2), ("D", -1),
    ("A", 0), ("E", 1), ("B", 2), ("F#", 3), ("C#", 4), ("G#", 5), ("D#", 6), ("A#", 7),
];

/// "F# minor" → (3, true); sharps are positive, flats negative
fn parse_key_signature(value: &str) -> Option<(i8, bool)> {
    let mut parts = value.split_whitespace();
    let tonic = parts.next()?.replace('♯', "#").replace('♭', "b");
    let minor = match parts.next().map(str::to_lowercase).as_deref() {
        None | Some("major") => false,
        Some("minor") => true,
        Some(_) => return None,
    };
    let table = if minor { &MINOR_KEYS } else { &MAJOR_KEYS };
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(&tonic))
        .map(|(_, sharps)| (*sharps, minor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrackInfo;
    use chrono::Utc;

    fn metadata(tracks: Vec<TrackInfo>) -> MidiMetadata {
        MidiMetadata {
            title: "Test".to_string(),
            composer: "Unknown".to_string(),
            copyright: "Unknown".to_string(),
            processing_date: Utc::now(),
            software: "scorekit-convert/test".to_string(),
            tracks,
        }
    }

    fn track(name: &str) -> TrackInfo {
        TrackInfo {
            name: name.to_string(),
            instrument: "Piano".to_string(),
            clef: name.to_string(),
            note_count: 10,
        }
    }

    fn elements() -> DetectedElements {
        DetectedElements {
            tempo: Some(100),
            time_signature: Some("3/4".to_string()),
            key_signature: Some("D major".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_separate_tracks_layout() {
        let options = ProcessingOptions {
            separate_tracks: true,
            ..Default::default()
        };
        let bytes = MetadataMidiEncoder
            .encode(&metadata(vec![track("Treble"), track("Bass")]), &elements(), &options)
            .unwrap();

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 3);
    }

    #[test]
    fn test_merged_track_layout() {
        let bytes = MetadataMidiEncoder
            .encode(
                &metadata(vec![track("Treble"), track("Bass")]),
                &elements(),
                &ProcessingOptions::default(),
            )
            .unwrap();

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::SingleTrack);
        assert_eq!(smf.tracks.len(), 1);

        let tempo = smf.tracks[0].iter().find_map(|event| match event.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
            _ => None,
        });
        assert_eq!(tempo, Some(600_000));

        let time_sig = smf.tracks[0].iter().find_map(|event| match event.kind {
            TrackEventKind::Meta(MetaMessage::TimeSignature(n, d, _, _)) => Some((n, d)),
            _ => None,
        });
        assert_eq!(time_sig, Some((3, 2)));
    }

    #[test]
    fn test_zero_tempo_rejected() {
        let elements = DetectedElements {
            tempo: Some(0),
            ..Default::default()
        };
        let result = MetadataMidiEncoder.encode(&metadata(vec![]), &elements, &ProcessingOptions::default());
        assert!(matches!(result, Err(EncodeError::InvalidElement(_))));
    }

    fn written_tempo(bpm: u32) -> Option<u32> {
        let elements = DetectedElements {
            tempo: Some(bpm),
            ..Default::default()
        };
        let bytes = MetadataMidiEncoder
            .encode(&metadata(vec![]), &elements, &ProcessingOptions::default())
            .unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        smf.tracks[0].iter().find_map(|event| match event.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
            _ => None,
        })
    }

    #[test]
    fn test_very_slow_tempo_saturates() {
        let max = u24::max_value().as_int();
        assert_eq!(written_tempo(1), Some(max));
        assert_eq!(written_tempo(2), Some(max));
        assert_eq!(written_tempo(3), Some(max));
        // 4 bpm is the slowest tempo that fits exactly
        assert_eq!(written_tempo(4), Some(15_000_000));
        assert_eq!(written_tempo(240), Some(250_000));
    }

    #[test]
    fn test_parse_time_signature() {
        assert_eq!(parse_time_signature("4/4"), Some((4, 2)));
        assert_eq!(parse_time_signature("6/8"), Some((6, 3)));
        assert_eq!(parse_time_signature("3/5"), None);
        assert_eq!(parse_time_signature("common"), None);
        assert_eq!(parse_time_signature("0/4"), None);
    }

    #[test]
    fn test_parse_key_signature() {
        assert_eq!(parse_key_signature("C major"), Some((0, false)));
        assert_eq!(parse_key_signature("Bb major"), Some((-2, false)));
        assert_eq!(parse_key_signature("F# minor"), Some((3, true)));
        assert_eq!(parse_key_signature("d minor"), Some((-1, true)));
        assert_eq!(parse_key_signature("G"), Some((1, false)));
        assert_eq!(parse_key_signature("H dorian"), None);
    }
}
