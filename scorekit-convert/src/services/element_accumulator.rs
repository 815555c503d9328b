//! Accumulates partial element updates from stages
//!
//! Merge policy is last-writer-wins per field. A field absent from a partial
//! update leaves the accumulated value alone, so a field once set is never
//! unset within a job. An empty collection counts as absent.

use crate::models::DetectedElements;

#[derive(Debug, Clone, Default)]
pub struct ElementAccumulator {
    elements: DetectedElements,
}

impl ElementAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a partial update in place
    pub fn merge(&mut self, partial: DetectedElements) {
        let DetectedElements {
            time_signature,
            key_signature,
            tempo,
            tempo_marking,
            clefs,
            note_count,
            measures,
            dynamics,
            articulations,
        } = partial;

        overwrite(&mut self.elements.time_signature, time_signature);
        overwrite(&mut self.elements.key_signature, key_signature);
        match tempo {
            Some(0) => tracing::warn!("Ignoring non-positive tempo in element update"),
            other => overwrite(&mut self.elements.tempo, other),
        }
        overwrite(&mut self.elements.tempo_marking, tempo_marking);
        overwrite(&mut self.elements.clefs, clefs.filter(|c| !c.is_empty()));
        overwrite(&mut self.elements.note_count, note_count);
        overwrite(&mut self.elements.measures, measures);
        overwrite(&mut self.elements.dynamics, dynamics.filter(|d| !d.is_empty()));
        overwrite(
            &mut self.elements.articulations,
            articulations.filter(|a| !a.is_empty()),
        );
    }

    /// Owned copy for progress reporting
    pub fn snapshot(&self) -> DetectedElements {
        self.elements.clone()
    }

    pub fn elements(&self) -> &DetectedElements {
        &self.elements
    }

    /// Names of fields no stage has reported yet
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let e = &self.elements;
        let checks = [
            ("time_signature", e.time_signature.is_none()),
            ("key_signature", e.key_signature.is_none()),
            ("tempo", e.tempo.is_none()),
            ("clefs", e.clefs.as_ref().map_or(true, |c| c.is_empty())),
            ("note_count", e.note_count.is_none()),
            ("measures", e.measures.is_none()),
        ];
        checks
            .into_iter()
            .filter_map(|(name, missing)| missing.then_some(name))
            .collect()
    }
}

fn overwrite<T>(slot: &mut Option<T>, update: Option<T>) {
    if update.is_some() {
        *slot = update;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sets_present_fields() {
        let mut acc = ElementAccumulator::new();
        acc.merge(DetectedElements {
            time_signature: Some("4/4".to_string()),
            note_count: Some(120),
            ..Default::default()
        });

        let snapshot = acc.snapshot();
        assert_eq!(snapshot.time_signature.as_deref(), Some("4/4"));
        assert_eq!(snapshot.note_count, Some(120));
        assert!(snapshot.tempo.is_none());
    }

    #[test]
    fn test_absent_fields_never_unset() {
        let mut acc = ElementAccumulator::new();
        acc.merge(DetectedElements {
            key_signature: Some("G major".to_string()),
            ..Default::default()
        });
        acc.merge(DetectedElements {
            tempo: Some(96),
            ..Default::default()
        });
        acc.merge(DetectedElements::default());

        assert_eq!(acc.elements().key_signature.as_deref(), Some("G major"));
        assert_eq!(acc.elements().tempo, Some(96));
    }

    #[test]
    fn test_later_stage_refines() {
        let mut acc = ElementAccumulator::new();
        acc.merge(DetectedElements {
            note_count: Some(100),
            dynamics: Some(vec!["p".to_string()]),
            ..Default::default()
        });
        acc.merge(DetectedElements {
            note_count: Some(180),
            dynamics: Some(vec!["p".to_string(), "f".to_string()]),
            ..Default::default()
        });

        assert_eq!(acc.elements().note_count, Some(180));
        assert_eq!(
            acc.elements().dynamics,
            Some(vec!["p".to_string(), "f".to_string()])
        );
    }

    #[test]
    fn test_empty_collections_do_not_unset() {
        let mut acc = ElementAccumulator::new();
        acc.merge(DetectedElements {
            clefs: Some(DetectedElements::clef_set(["Treble", "Bass"])),
            dynamics: Some(vec!["mf".to_string()]),
            articulations: Some(vec!["staccato".to_string()]),
            ..Default::default()
        });
        acc.merge(DetectedElements {
            clefs: Some(Default::default()),
            dynamics: Some(vec![]),
            articulations: Some(vec![]),
            ..Default::default()
        });

        assert!(acc.elements().has_clef("Bass"));
        assert_eq!(acc.elements().dynamics, Some(vec!["mf".to_string()]));
        assert_eq!(acc.elements().articulations, Some(vec!["staccato".to_string()]));
        assert!(!acc.missing_fields().contains(&"clefs"));
    }

    #[test]
    fn test_empty_clefs_on_first_report_stay_missing() {
        let mut acc = ElementAccumulator::new();
        acc.merge(DetectedElements {
            clefs: Some(Default::default()),
            ..Default::default()
        });
        assert!(acc.elements().clefs.is_none());
        assert!(acc.missing_fields().contains(&"clefs"));
    }

    #[test]
    fn test_zero_tempo_ignored() {
        let mut acc = ElementAccumulator::new();
        acc.merge(DetectedElements {
            tempo: Some(120),
            ..Default::default()
        });
        acc.merge(DetectedElements {
            tempo: Some(0),
            ..Default::default()
        });
        assert_eq!(acc.elements().tempo, Some(120));
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut acc = ElementAccumulator::new();
        acc.merge(DetectedElements {
            measures: Some(8),
            ..Default::default()
        });
        let snapshot = acc.snapshot();
        acc.merge(DetectedElements {
            measures: Some(16),
            ..Default::default()
        });
        assert_eq!(snapshot.measures, Some(8));
        assert_eq!(acc.elements().measures, Some(16));
    }

    #[test]
    fn test_missing_fields() {
        let mut acc = ElementAccumulator::new();
        assert_eq!(acc.missing_fields().len(), 6);

        acc.merge(DetectedElements {
            time_signature: Some("3/4".to_string()),
            key_signature: Some("D minor".to_string()),
            tempo: Some(72),
            clefs: Some(DetectedElements::clef_set(["Treble"])),
            note_count: Some(64),
            ..Default::default()
        });
        assert_eq!(acc.missing_fields(), vec!["measures"]);
    }
}
