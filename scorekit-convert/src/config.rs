//! Bootstrap configuration for scorekit-convert
//!
//! Read once at startup from `convert.toml` (see `scorekit_common::config`
//! for the lookup order). Every key is optional; command-line flags override
//! the port and bind address afterwards.
//!
//! ```toml
//! port = 5790
//! bind_address = "127.0.0.1"
//! event_capacity = 100
//!
//! [logging]
//! level = "info"
//!
//! [recognition]
//! backend = "simulated"      # or "remote"
//! endpoint = "http://localhost:9000"
//! timeout_ms = 30000
//! time_scale = 1.0
//!
//! [failures]
//! failure_rate = 0.10
//! partial_rate = 0.15
//! ```

use serde::Deserialize;
use scorekit_common::{Error, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::executors::{RemoteRecognizer, SimulatedRecognizer, StageExecutor};
use crate::services::failure_source::{DEFAULT_FAILURE_RATE, DEFAULT_PARTIAL_RATE};
use crate::services::{FailureSource, RandomFailureSource};

pub const CONFIG_FILE_NAME: &str = "convert.toml";
pub const DEFAULT_PORT: u16 = 5790;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub port: u16,
    pub bind_address: String,
    /// Broadcast buffer for SSE subscribers
    pub event_capacity: usize,
    pub logging: LoggingConfig,
    pub recognition: RecognitionConfig,
    pub failures: FailureConfig,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            logging: LoggingConfig::default(),
            recognition: RecognitionConfig::default(),
            failures: FailureConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` wins when set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionBackend {
    #[default]
    Simulated,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub backend: RecognitionBackend,
    /// Base URL of the recognition service (remote backend only)
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
    /// Multiplier on simulated stage durations
    pub time_scale: f64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            backend: RecognitionBackend::Simulated,
            endpoint: None,
            timeout_ms: 30_000,
            time_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FailureConfig {
    pub failure_rate: f64,
    pub partial_rate: f64,
}

impl Default for FailureConfig {
    fn default() -> Self {
        Self {
            failure_rate: DEFAULT_FAILURE_RATE,
            partial_rate: DEFAULT_PARTIAL_RATE,
        }
    }
}

impl ConvertConfig {
    /// Resolve, load and validate the configuration file
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = scorekit_common::config::resolve_config_path(explicit, CONFIG_FILE_NAME);
        let config: Self = scorekit_common::config::load_toml_or_default(path.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = scorekit_common::config::parse_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        self.bind_ip()?;

        for (name, rate) in [
            ("failures.failure_rate", self.failures.failure_rate),
            ("failures.partial_rate", self.failures.partial_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::Config(format!("{} must be within [0, 1], got {}", name, rate)));
            }
        }

        let scale = self.recognition.time_scale;
        if !scale.is_finite() || scale < 0.0 {
            return Err(Error::Config(format!(
                "recognition.time_scale must be >= 0, got {}",
                scale
            )));
        }

        if self.recognition.backend == RecognitionBackend::Remote {
            match self.recognition.endpoint.as_deref().map(str::trim) {
                Some(endpoint) if !endpoint.is_empty() => {}
                _ => {
                    return Err(Error::Config(
                        "recognition.endpoint is required for the remote backend".to_string(),
                    ))
                }
            }
            if self.recognition.timeout_ms == 0 {
                return Err(Error::Config("recognition.timeout_ms must be positive".to_string()));
            }
        }

        Ok(())
    }

    fn bind_ip(&self) -> Result<IpAddr> {
        self.bind_address.parse().map_err(|e| {
            Error::Config(format!("Invalid bind_address '{}': {}", self.bind_address, e))
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(self.bind_ip()?, self.port))
    }

    /// Stage executor for the configured backend
    pub fn build_executor(&self) -> anyhow::Result<Arc<dyn StageExecutor>> {
        match self.recognition.backend {
            RecognitionBackend::Simulated => {
                Ok(Arc::new(SimulatedRecognizer::new(self.recognition.time_scale)))
            }
            RecognitionBackend::Remote => {
                let endpoint = self
                    .recognition
                    .endpoint
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("recognition.endpoint is not set"))?;
                let timeout = Duration::from_millis(self.recognition.timeout_ms);
                Ok(Arc::new(RemoteRecognizer::new(endpoint, timeout)?))
            }
        }
    }

    pub fn build_failure_source(&self) -> Arc<dyn FailureSource> {
        Arc::new(RandomFailureSource::new(
            self.failures.failure_rate,
            self.failures.partial_rate,
        ))
    }
}
