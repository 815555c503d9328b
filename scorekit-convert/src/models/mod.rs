//! Data models for scorekit-convert
//!
//! - Conversion job state machine and snapshots
//! - Processing options and the submitted document
//! - Detected musical elements
//! - Terminal outcomes: result and classified error

pub mod document;
pub mod elements;
pub mod job;
pub mod options;
pub mod processing_error;
pub mod result;

pub use document::Document;
pub use elements::DetectedElements;
pub use job::{Job, JobOutcome, JobSnapshot, JobStatus, Phase, StateTransition};
pub use options::{ProcessingMode, ProcessingOptions};
pub use processing_error::{ErrorKind, ProcessingError, LOW_CONFIDENCE_THRESHOLD};
pub use result::{MidiMetadata, ProcessingResult, TrackInfo};
