//! Bootstrap configuration loading tests

use serial_test::serial;
use std::io::Write;
use std::path::Path;

use scorekit_convert::config::{ConvertConfig, RecognitionBackend};

fn write_config(dir: &Path, relative: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn test_load_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "convert.toml",
        r#"
port = 6100
event_capacity = 32

[logging]
level = "debug"

[recognition]
time_scale = 0.0

[failures]
failure_rate = 0.0
partial_rate = 0.0
"#,
    );

    let config = ConvertConfig::load(Some(&path)).unwrap();
    assert_eq!(config.port, 6100);
    assert_eq!(config.event_capacity, 32);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.recognition.time_scale, 0.0);
    assert_eq!(config.failures.failure_rate, 0.0);
    assert_eq!(config.recognition.backend, RecognitionBackend::Simulated);
}

#[test]
fn test_missing_explicit_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ConvertConfig::load(Some(&dir.path().join("absent.toml")));
    assert!(result.is_err());
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "convert.toml", "[failures]\nfailure_rate = 2.0\n");
    assert!(ConvertConfig::load(Some(&path)).is_err());

    let path = write_config(dir.path(), "broken.toml", "port = \"not a number\"\n");
    assert!(ConvertConfig::load(Some(&path)).is_err());
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_user_config_directory_is_searched() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "scorekit/convert.toml", "port = 6200\n");

    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", dir.path());
    let loaded = ConvertConfig::load(None);
    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(loaded.unwrap().port, 6200);
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_defaults_without_any_file() {
    let dir = tempfile::tempdir().unwrap();

    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", dir.path());
    let loaded = ConvertConfig::load(None);
    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }

    // A system-wide /etc/scorekit/convert.toml would take over here
    if !Path::new("/etc/scorekit/convert.toml").exists() {
        assert_eq!(loaded.unwrap(), ConvertConfig::default());
    }
}
