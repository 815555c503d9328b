//! HTTP API handlers for scorekit-convert
//!
//! JSON REST for job control plus an SSE progress stream.

pub mod conversion;
pub mod health;
pub mod sse;

pub use conversion::conversion_routes;
pub use health::health_routes;
pub use sse::conversion_event_stream;
