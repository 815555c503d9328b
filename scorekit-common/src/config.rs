//! Bootstrap configuration file discovery and loading
//!
//! Configuration file lookup follows this priority order:
//! 1. Explicit path (command-line argument or its environment variable)
//! 2. User config directory (`~/.config/scorekit/<file>` on Linux)
//! 3. System config directory (`/etc/scorekit/<file>`, Linux only)
//! 4. None: caller falls back to built-in defaults

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory name used under the platform config directory
pub const CONFIG_DIR_NAME: &str = "scorekit";

/// Resolve which configuration file to load
///
/// An explicit path is returned as-is, even if it does not exist, so the
/// caller reports the missing file instead of silently using defaults.
pub fn resolve_config_path(explicit: Option<&Path>, file_name: &str) -> Option<PathBuf> {
    // Priority 1: explicit path
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    // Priority 2: user config directory
    if let Some(user_config) = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(file_name)) {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    // Priority 3: system config (Linux only)
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(CONFIG_DIR_NAME).join(file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    debug!("No {} found, using built-in defaults", file_name);
    None
}

/// Parse a TOML document into a config struct
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load a TOML config file, or the type's defaults when no path is given
pub fn load_toml_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };

    if !path.exists() {
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        warn!("Read TOML failed ({}): {}", path.display(), e);
        Error::Io(e)
    })?;
    let config = parse_toml(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        port: u16,
        #[serde(default)]
        name: Option<String>,
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = PathBuf::from("/nonexistent/convert.toml");
        assert_eq!(resolve_config_path(Some(&path), "convert.toml"), Some(path));
    }

    #[test]
    fn test_load_defaults_without_path() {
        let sample: Sample = load_toml_or_default(None).unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 5790\nname = \"test\"").unwrap();

        let sample: Sample = load_toml_or_default(Some(file.path())).unwrap();
        assert_eq!(sample.port, 5790);
        assert_eq!(sample.name.as_deref(), Some("test"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result: Result<Sample> = load_toml_or_default(Some(Path::new("/nonexistent/x.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_unreadable_file_is_io_error() {
        // A directory exists but cannot be read as a file
        let dir = tempfile::tempdir().unwrap();
        let result: Result<Sample> = load_toml_or_default(Some(dir.path()));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let result: Result<Sample> = parse_toml("port = \"not a number\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
