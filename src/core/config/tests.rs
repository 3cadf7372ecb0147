use super::data::Config;
use super::io::ConfigError;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config {
        default_model: Some("gpt-4o".to_string()),
        base_url: Some("http://localhost:8080/v1".to_string()),
        request_timeout_secs: Some(30),
    };
    config.save_to_path(&config_path).expect("Failed to save config");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded, config);

    config.default_model = None;
    config.save_to_path(&config_path).expect("Failed to save config");
    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded.default_model, None);
    assert_eq!(loaded.request_timeout_secs, Some(30));
}

#[test]
fn test_invalid_toml_reports_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "default_model = [unterminated").unwrap();

    let err = Config::load_from_path(&config_path).expect_err("parse should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse config at"));
}

#[test]
fn test_effective_base_url_precedence() {
    let mut config = Config::default();
    assert_eq!(config.effective_base_url(None), "https://api.openai.com/v1");

    config.base_url = Some("http://localhost:1234/v1".to_string());
    assert_eq!(config.effective_base_url(None), "http://localhost:1234/v1");
    assert_eq!(
        config.effective_base_url(Some("  ".to_string())),
        "http://localhost:1234/v1"
    );
    assert_eq!(
        config.effective_base_url(Some("https://openrouter.ai/api/v1".to_string())),
        "https://openrouter.ai/api/v1"
    );
}

#[test]
fn test_request_timeout() {
    let mut config = Config::default();
    assert_eq!(config.request_timeout(), None);
    config.request_timeout_secs = Some(0);
    assert_eq!(config.request_timeout(), None);
    config.request_timeout_secs = Some(45);
    assert_eq!(config.request_timeout(), Some(Duration::from_secs(45)));
}

