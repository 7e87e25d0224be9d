//! File round-trips for the editor configuration.

use lightplot_core::{BehaviorKind, BehaviorSpec};
use lightplot_settings::{ConfigError, EditorConfig, SelectionPolicy, SettingsError};
use tempfile::TempDir;

fn customised() -> EditorConfig {
    let mut config = EditorConfig::default();
    config.grid.snap = true;
    config.grid.size = 5.0;
    config.rotation.snap_angle = 15.0;
    config.resize.max_width = Some(400.0);
    config.selection.policy = SelectionPolicy::Add;
    config
        .element_types
        .entry("fixture".to_string())
        .or_default()
        .behaviors
        .push(BehaviorSpec::new(BehaviorKind::Droppable).with_option("centerOnPointer", false));
    config
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.toml");

    let config = customised();
    config.save_to_file(&path).expect("save toml");
    let loaded = EditorConfig::load_from_file(&path).expect("load toml");

    assert_eq!(loaded, config);
}

#[test]
fn test_json_round_trip_in_nested_dir() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("nested").join("lightplot.json");

    let config = customised();
    config.save_to_file(&path).expect("save json");
    let loaded = EditorConfig::load_from_file(&path).expect("load json");

    assert_eq!(loaded, config);
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.yaml");

    let err = EditorConfig::default().save_to_file(&path).unwrap_err();
    assert!(matches!(
        err,
        SettingsError::Config(ConfigError::UnsupportedFormat(ref ext)) if ext == "yaml"
    ));
}

#[test]
fn test_invalid_file_fails_validation_on_load() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[grid]\nsize = -4.0\n").expect("write");

    let err = EditorConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::Config(ConfigError::ValueOutOfRange { .. })));
}

#[test]
fn test_load_or_default_falls_back() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("absent.toml");
    assert_eq!(EditorConfig::load_or_default(Some(&missing)), EditorConfig::default());

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "grid = [").expect("write");
    assert_eq!(EditorConfig::load_or_default(Some(&broken)), EditorConfig::default());
}
