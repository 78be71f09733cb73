//! Unit tests for the JSON settings engine.

use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;

use linkdeck::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use linkdeck::types::errors::SettingsError;
use linkdeck::types::settings::AppSettings;

fn engine_in(dir: &TempDir) -> SettingsEngine {
    let path = dir.path().join("config").join("settings.json");
    SettingsEngine::new(Some(path.to_string_lossy().to_string()))
}

#[test]
fn test_load_defaults_when_no_file() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);
    assert_eq!(engine.load().unwrap(), AppSettings::default());
    assert!(!Path::new(engine.get_config_path()).exists(), "load must not create the file");
}

#[test]
fn test_default_values() {
    let defaults = AppSettings::default();
    assert!(defaults.vault.enabled);
    assert_eq!(defaults.vault.auto_lock_minutes, None);
    assert_eq!(defaults.storage.database_path, None);
    assert_eq!(defaults.logging.level, "info");
}

#[test]
fn test_set_value_persists_across_engines() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);
    engine.load().unwrap();
    engine.set_value("vault.auto_lock_minutes", json!(15)).unwrap();
    engine.set_value("logging.level", json!("linkdeck=debug")).unwrap();

    let mut reloaded = engine_in(&dir);
    let settings = reloaded.load().unwrap();
    assert_eq!(settings.vault.auto_lock_minutes, Some(15));
    assert_eq!(settings.logging.level, "linkdeck=debug");
}

#[test]
fn test_set_value_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);
    engine.load().unwrap();
    let result = engine.set_value("vault.colour", json!("red"));
    assert!(matches!(result, Err(SettingsError::InvalidKey(_))));
}

#[test]
fn test_set_value_rejects_empty_key() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);
    assert!(matches!(engine.set_value("", json!(true)), Err(SettingsError::InvalidKey(_))));
}

#[test]
fn test_set_value_rejects_wrong_type_and_keeps_state() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);
    engine.load().unwrap();
    let result = engine.set_value("vault.enabled", json!("yes"));
    assert!(matches!(result, Err(SettingsError::InvalidValue(_))));
    assert!(engine.get_settings().vault.enabled);
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);
    engine.set_value("vault.enabled", json!(false)).unwrap();
    assert!(!engine.get_settings().vault.enabled);

    engine.reset().unwrap();
    assert_eq!(*engine.get_settings(), AppSettings::default());
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);
    let path = Path::new(engine.get_config_path()).to_path_buf();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, r#"{"vault":{"enabled":false,"auto_lock_minutes":5}}"#).unwrap();

    let settings = engine.load().unwrap();
    assert!(!settings.vault.enabled);
    assert_eq!(settings.logging.level, "info");
}

#[test]
fn test_load_malformed_json() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);
    let path = Path::new(engine.get_config_path()).to_path_buf();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "{ invalid json }").unwrap();

    assert!(matches!(engine.load(), Err(SettingsError::SerializationError(_))));
}
