//! Maps stage failure signals onto the error taxonomy
//!
//! Classification is total: a known cause maps directly, a free-form message
//! is matched by keyword, and anything else is `unknown`. Failures are
//! low-confidence outcomes by construction, so the attached confidence is
//! always clamped into [0.1, 0.4].

use serde::{Deserialize, Serialize};

use crate::models::{ErrorKind, ProcessingError, LOW_CONFIDENCE_THRESHOLD};

pub const MIN_FAILURE_CONFIDENCE: f64 = 0.1;
pub const MAX_FAILURE_CONFIDENCE: f64 = 0.4;

/// Certainty used when a signal does not carry its own
const DEFAULT_CERTAINTY: f64 = 0.25;

/// Canonical failure causes a stage can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    Blur,
    Notation,
    Handwritten,
    MultipleSignatures,
    Format,
}

/// Failure indicator raised by a stage
#[derive(Debug, Clone, PartialEq)]
pub struct FailureSignal {
    /// Known cause, if the stage could name one
    pub cause: Option<FailureCause>,
    /// Raw message (remote service reply, transport error, ...)
    pub detail: Option<String>,
    /// Classifier certainty before clamping
    pub certainty: f64,
}

impl FailureSignal {
    pub fn known(cause: FailureCause) -> Self {
        Self {
            cause: Some(cause),
            detail: None,
            certainty: DEFAULT_CERTAINTY,
        }
    }

    pub fn message(detail: impl Into<String>) -> Self {
        Self {
            cause: None,
            detail: Some(detail.into()),
            certainty: DEFAULT_CERTAINTY,
        }
    }

    pub fn with_certainty(mut self, certainty: f64) -> Self {
        self.certainty = certainty;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Stateless classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a signal raised by the stage labelled `stage_label`
    pub fn classify(&self, signal: &FailureSignal, stage_label: Option<&str>) -> ProcessingError {
        let kind = match signal.cause {
            Some(cause) => kind_for_cause(cause),
            None => signal
                .detail
                .as_deref()
                .map(kind_for_message)
                .unwrap_or(ErrorKind::Unknown),
        };

        let certainty = if signal.certainty.is_finite() {
            signal.certainty
        } else {
            DEFAULT_CERTAINTY
        };
        let confidence = certainty.clamp(MIN_FAILURE_CONFIDENCE, MAX_FAILURE_CONFIDENCE);

        ProcessingError {
            kind,
            message: canonical_message(kind).to_string(),
            suggestions: suggestions(kind).iter().map(|s| s.to_string()).collect(),
            confidence,
            low_confidence: confidence < LOW_CONFIDENCE_THRESHOLD,
            stage_label: stage_label.map(str::to_string),
            detail: signal.detail.clone(),
        }
    }
}

fn kind_for_cause(cause: FailureCause) -> ErrorKind {
    match cause {
        FailureCause::Blur => ErrorKind::Blur,
        FailureCause::Notation => ErrorKind::Notation,
        FailureCause::Handwritten => ErrorKind::Handwritten,
        FailureCause::MultipleSignatures => ErrorKind::MultipleSignatures,
        FailureCause::Format => ErrorKind::Format,
    }
}

/// Keyword table, checked in order; first match wins
const KEYWORDS: &[(ErrorKind, &[&str])] = &[
    (ErrorKind::Format, &["corrupt", "unsupported format", "file type", "unreadable file", "mime"]),
    (ErrorKind::Handwritten, &["handwrit", "manuscript"]),
    (ErrorKind::Blur, &["blur", "resolution", "out of focus", "dpi"]),
    (
        ErrorKind::MultipleSignatures,
        &["multiple signature", "conflicting", "signature conflict"],
    ),
    (ErrorKind::Notation, &["notation", "too complex", "complexity"]),
];

fn kind_for_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ErrorKind::Unknown)
}

fn canonical_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Blur => "The image is too blurry or low-resolution to read reliably.",
        ErrorKind::Notation => "The score contains notation that is too complex to convert.",
        ErrorKind::Format => "The document format is unsupported or the file is corrupt.",
        ErrorKind::Handwritten => {
            "Handwritten notation was detected; recognition accuracy is reduced."
        }
        ErrorKind::MultipleSignatures => "Conflicting time or key signatures were detected.",
        ErrorKind::Unknown => "The sheet music could not be processed.",
    }
}

fn suggestions(kind: ErrorKind) -> &'static [&'static str] {
    match kind {
        ErrorKind::Blur => &[
            "Scan or photograph the page at 300 DPI or higher",
            "Make sure the page is in focus and evenly lit",
            "Avoid shadows and glare across the staff lines",
        ],
        ErrorKind::Notation => &[
            "Try a simpler arrangement of the piece",
            "Switch to enhanced processing mode",
            "Use manual assist mode to confirm difficult passages",
        ],
        ErrorKind::Format => &[
            "Upload a PDF, PNG, JPEG or TIFF file",
            "Re-export the document from the application that created it",
            "Check that the file opens in another viewer",
        ],
        ErrorKind::Handwritten => &[
            "Use a printed or engraved edition if one is available",
            "Use manual assist mode to review recognized notes",
            "Write on a clean staff with dark ink",
        ],
        ErrorKind::MultipleSignatures => &[
            "Select only the pages that share one time and key signature",
            "Set the preferred key in the processing options",
            "Split the score into separate uploads at signature changes",
        ],
        ErrorKind::Unknown => &[
            "Try uploading the document again",
            "Try a different scan or export of the same score",
            "Switch to enhanced processing mode",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CAUSES: [FailureCause; 5] = [
        FailureCause::Blur,
        FailureCause::Notation,
        FailureCause::Handwritten,
        FailureCause::MultipleSignatures,
        FailureCause::Format,
    ];

    #[test]
    fn test_known_causes_map_directly() {
        let classifier = ErrorClassifier::new();
        let expected = [
            ErrorKind::Blur,
            ErrorKind::Notation,
            ErrorKind::Handwritten,
            ErrorKind::MultipleSignatures,
            ErrorKind::Format,
        ];
        for (cause, kind) in ALL_CAUSES.into_iter().zip(expected) {
            let error = classifier.classify(&FailureSignal::known(cause), None);
            assert_eq!(error.kind, kind);
        }
    }

    #[test]
    fn test_every_kind_has_suggestions() {
        let classifier = ErrorClassifier::new();
        for cause in ALL_CAUSES {
            let error = classifier.classify(&FailureSignal::known(cause), Some("stage"));
            assert!(!error.suggestions.is_empty());
            assert_eq!(error.stage_label.as_deref(), Some("stage"));
        }
        let unknown = classifier.classify(&FailureSignal::message("???"), None);
        assert_eq!(unknown.kind, ErrorKind::Unknown);
        assert!(!unknown.suggestions.is_empty());
    }

    #[test]
    fn test_message_keywords() {
        let classifier = ErrorClassifier::new();
        let classify = |msg: &str| classifier.classify(&FailureSignal::message(msg), None).kind;

        assert_eq!(classify("Image resolution below 150 DPI"), ErrorKind::Blur);
        assert_eq!(classify("Handwritten score detected"), ErrorKind::Handwritten);
        assert_eq!(classify("Unsupported notation: figured bass"), ErrorKind::Notation);
        assert_eq!(classify("Conflicting key signatures on page 2"), ErrorKind::MultipleSignatures);
        assert_eq!(classify("PDF stream is corrupt"), ErrorKind::Format);
        assert_eq!(classify("connection refused"), ErrorKind::Unknown);
    }

    #[test]
    fn test_signal_without_cause_or_detail_is_unknown() {
        let signal = FailureSignal {
            cause: None,
            detail: None,
            certainty: 0.3,
        };
        assert_eq!(ErrorClassifier::new().classify(&signal, None).kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_confidence_clamped_and_flagged_low() {
        let classifier = ErrorClassifier::new();
        for certainty in [-1.0, 0.0, 0.25, 0.9, f64::NAN] {
            let signal = FailureSignal::known(FailureCause::Blur).with_certainty(certainty);
            let error = classifier.classify(&signal, None);
            assert!(error.confidence >= MIN_FAILURE_CONFIDENCE);
            assert!(error.confidence <= MAX_FAILURE_CONFIDENCE);
            assert!(error.low_confidence);
            assert!(error.is_low_confidence());
        }
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = ErrorClassifier::new();
        let signal = FailureSignal::known(FailureCause::Notation).with_certainty(0.33);
        assert_eq!(classifier.classify(&signal, None), classifier.classify(&signal, None));
    }
}
