//! # scorekit common library
//!
//! Shared code for the scorekit crates:
//! - Common error type
//! - Broadcast event bus
//! - Bootstrap configuration file discovery and loading
//! - Human-readable duration formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;

pub use error::{Error, Result};
pub use events::EventBus;
