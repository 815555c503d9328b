//! Conversion services
//!
//! Leaf components first (catalog, estimator, accumulator, classifier), then
//! the finalization helpers, then the controller that drives them.

pub mod element_accumulator;
pub mod error_classifier;
pub mod eta_estimator;
pub mod failure_source;
pub mod midi_encoder;
pub mod pipeline_controller;
pub mod result_finalizer;
pub mod stage_catalog;
pub mod title_recognizer;

pub use element_accumulator::ElementAccumulator;
pub use error_classifier::{ErrorClassifier, FailureCause, FailureSignal};
pub use eta_estimator::EtaEstimator;
pub use failure_source::{FailureSource, NoFailures, RandomFailureSource, ScriptedFailureSource};
pub use midi_encoder::{EncodeError, MetadataMidiEncoder, MidiEncoder};
pub use pipeline_controller::{JobHandle, PipelineController};
pub use result_finalizer::{Finalization, ResultFinalizer};
pub use stage_catalog::{Stage, StageCatalog};
pub use title_recognizer::{TitleMatch, TitleRecognizer};
