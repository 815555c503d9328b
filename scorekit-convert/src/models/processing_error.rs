//! Classified recognition failure delivered as a terminal `error` outcome

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Confidence below this value is reported as low-confidence
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input quality insufficient (low resolution, out of focus)
    Blur,
    /// Unsupported or overly complex notation
    Notation,
    /// Unsupported or corrupt container
    Format,
    /// Non-printed input, reduced accuracy
    Handwritten,
    /// Conflicting structural signals (time/key signatures)
    MultipleSignatures,
    /// Unclassified
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Blur => "blur",
            ErrorKind::Notation => "notation",
            ErrorKind::Format => "format",
            ErrorKind::Handwritten => "handwritten",
            ErrorKind::MultipleSignatures => "multiple_signatures",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure with remediation suggestions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct ProcessingError {
    pub kind: ErrorKind,

    /// Canonical, user-facing message for `kind`
    pub message: String,

    /// Ordered remediation steps (never empty)
    pub suggestions: Vec<String>,

    /// Certainty that the failure belongs to `kind` (0.0 - 1.0)
    pub confidence: f64,

    /// `confidence < 0.5`
    pub low_confidence: bool,

    /// Stage that raised the failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_label: Option<String>,

    /// Raw detail from the failing stage, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProcessingError {
    pub fn is_low_confidence(&self) -> bool {
        self.confidence < LOW_CONFIDENCE_THRESHOLD
    }
}
