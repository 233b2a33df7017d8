use super::load_existing_config as load_existing_config_impl;
use std::fs;
use tempfile::TempDir;

#[test]
fn load_existing_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = load_existing_config_impl(temp_dir.path()).expect("config loaded successfully");
    assert!(!config.ollama.host.is_empty());
    assert!(config.ollama.port > 0);
    assert!(!config.store.collection.is_empty());
    assert_eq!(config.get_base_dir(), temp_dir.path());
}

#[test]
fn broken_config_falls_back_to_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(temp_dir.path().join("config.toml"), "[store\n").expect("should write config");

    let config = load_existing_config_impl(temp_dir.path()).expect("defaults should be used");
    assert_eq!(config.store.database, "test");
    assert_eq!(config.get_base_dir(), temp_dir.path());
}
