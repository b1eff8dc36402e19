// Configuration tests

use super::*;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// RAII environment variable guard
struct EnvGuard {
    key: String,
    original: Option<String>,
}

impl EnvGuard {
    fn set(key: &str, value: &str) -> Self {
        let original = env::var(key).ok();
        // SAFETY: tests touching the environment run under serial_test
        unsafe { env::set_var(key, value) };
        Self {
            key: key.to_string(),
            original,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: see EnvGuard::set
        match &self.original {
            Some(v) => unsafe { env::set_var(&self.key, v) },
            None => unsafe { env::remove_var(&self.key) },
        }
    }
}

/// Writes `contents` to a config file; the file lives as long as the returned dir.
fn temp_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn test_app_config_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.server.bind, "127.0.0.1:3000");
    assert_eq!(config.generation.default_model, "claude-sonnet-4-20250514");
    assert_eq!(config.generation.max_tokens, 4096);
    assert_eq!(config.generation.history_limit, 6);
    assert_eq!(config.generation.retry_status, "simplifying...");
    assert_eq!(config.network.max_retries, 0);
    assert_eq!(config.network.connect_timeout, 10);
    assert_eq!(config.providers.anthropic_version, "2023-06-01");
    assert_eq!(config.client.url, "http://127.0.0.1:3000/api/compose");
    assert!(config.client.colored);
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_provider_bases() {
    let providers = ProvidersConfig::default();
    assert_eq!(providers.anthropic_base(), "https://api.anthropic.com");
    assert_eq!(providers.openai_base(), "https://api.openai.com");
    assert_eq!(
        providers.google_base(),
        "https://generativelanguage.googleapis.com"
    );
}

#[test]
#[serial]
fn test_load_from_missing_file_uses_defaults() {
    let config = load_config_from(Some(Path::new("/nonexistent/strudel/config.toml"))).unwrap();
    assert_eq!(config.generation, GenerationConfig::default());
}

#[test]
#[serial]
fn test_load_from_file() {
    let (_dir, path) = temp_config(
        r#"
[server]
bind = "0.0.0.0:8080"

[generation]
default_model = "gpt-4o"
history_limit = 4

[validation]
max_voices = 5

[providers]
openai_endpoint = "http://localhost:9999"
"#,
    );

    let config = load_config_from(Some(path.as_path())).unwrap();
    assert_eq!(config.server.bind, "0.0.0.0:8080");
    assert_eq!(config.generation.default_model, "gpt-4o");
    assert_eq!(config.generation.history_limit, 4);
    // untouched keys keep their defaults
    assert_eq!(config.generation.max_tokens, 4096);
    assert_eq!(config.validation.max_voices, 5);
    assert_eq!(config.validation.max_lines, 80);
    assert_eq!(config.providers.openai_base(), "http://localhost:9999");
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let (_dir, path) = temp_config("[generation]\nmax_tokens = 1000\n");
    let _tokens = EnvGuard::set("STRUDEL_GATEWAY__GENERATION__MAX_TOKENS", "2048");
    let _retries = EnvGuard::set("STRUDEL_GATEWAY__NETWORK__MAX_RETRIES", "2");

    let config = load_config_from(Some(path.as_path())).unwrap();
    assert_eq!(config.generation.max_tokens, 2048);
    assert_eq!(config.network.max_retries, 2);
}

#[test]
#[serial]
fn test_invalid_values_rejected() {
    let (_dir, path) = temp_config("[validation]\nmax_voices = 0\n");
    let err = load_config_from(Some(path.as_path())).unwrap_err();
    assert!(err.to_string().contains("validation.max_voices cannot be 0"));

    let (_dir, path) = temp_config("[server]\nbind = \"not-an-address\"\n");
    assert!(load_config_from(Some(path.as_path())).is_err());

    let (_dir, path) = temp_config("[providers]\ngoogle_endpoint = \"ftp://x\"\n");
    assert!(load_config_from(Some(path.as_path())).is_err());
}

#[test]
fn test_network_validate_zero_timeout() {
    let network = NetworkConfig {
        request_timeout: 0,
        ..NetworkConfig::default()
    };
    assert!(network.validate().is_err());
}

#[test]
fn test_serialized_config_round_trips_through_toml() {
    let config = AppConfig::default();
    let text = toml::to_string_pretty(&config).unwrap();
    assert!(text.contains("[generation]"));
    let parsed: AppConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}
