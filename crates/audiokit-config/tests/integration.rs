//! Integration tests for audiokit-config: files on disk and subscriber setup.

use audiokit_config::{ConfigError, EngineConfig, LoggingConfig, init_tracing};
use tempfile::tempdir;

#[test]
fn save_then_load_creates_parent_dirs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/deeper/engine.toml");
    let config = EngineConfig {
        sample_rate: 96000,
        block_size: 512,
        ..EngineConfig::default()
    };

    config.save(&path).unwrap();
    assert!(path.exists());
    assert_eq!(EngineConfig::load(&path).unwrap(), config);
}

#[test]
fn load_validates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "channels = 0\n").unwrap();

    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidParameter { ref key, .. } if key == "channels"));
}

#[test]
fn load_missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { path: ref p, .. } if *p == path));
}

#[test]
fn tracing_installs_once() {
    let dir = tempdir().unwrap();
    let logging = LoggingConfig {
        level: "info".to_string(),
        file: Some(dir.path().join("audiokit.log")),
    };

    init_tracing(&logging).unwrap();
    assert!(dir.path().join("audiokit.log").exists());

    let again = init_tracing(&LoggingConfig::default()).unwrap_err();
    assert!(matches!(again, ConfigError::Logging(_)));
}
