//! scorekit-convert library interface
//!
//! Sheet-music to MIDI conversion: the pipeline controller, its stage
//! executors and the HTTP API that exposes it.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod executors;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, ControllerError};

use axum::Router;
use chrono::{DateTime, Utc};
use scorekit_common::EventBus;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::ConvertConfig;
use crate::events::ConversionEvent;
use crate::services::PipelineController;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<PipelineController>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(controller: PipelineController) -> Self {
        Self {
            controller: Arc::new(controller),
            startup_time: Utc::now(),
        }
    }

    /// Wire a controller from the bootstrap configuration
    pub fn from_config(config: &ConvertConfig) -> anyhow::Result<Self> {
        let event_bus: EventBus<ConversionEvent> = EventBus::new(config.event_capacity);
        let controller = PipelineController::new(
            config.build_executor()?,
            config.build_failure_source(),
            event_bus,
        );
        Ok(Self::new(controller))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::conversion_routes())
        .route("/convert/events", get(api::conversion_event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
