//! Tests for layered configuration loading
//!
//! Precedence from lowest to highest: defaults, TOML file, environment,
//! command line overrides. Tests touching process environment run serially.

use std::fs;
use std::path::PathBuf;

use serial_test::serial;
use tempfile::TempDir;

use gitlab_insight::services::config::{ENV_GITLAB_TOKEN, ENV_GITLAB_URL, ENV_PROJECT_ID};
use gitlab_insight::services::{ConfigError, ConfigOverrides, HostConfig};

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).expect("Failed to write config file");
    path
}

fn clear_env() {
    // SAFETY: tests that mutate the environment are marked #[serial]
    unsafe {
        std::env::remove_var(ENV_GITLAB_URL);
        std::env::remove_var(ENV_GITLAB_TOKEN);
        std::env::remove_var(ENV_PROJECT_ID);
    }
}

fn set_env(key: &str, value: &str) {
    // SAFETY: tests that mutate the environment are marked #[serial]
    unsafe {
        std::env::set_var(key, value);
    }
}

const FILE_CONFIG: &str = r#"
gitlab_url = "https://gitlab.example.com"
token = "file-token"
project_id = "platform/api"
retry_attempts = 5
"#;

#[test]
#[serial]
fn test_explicit_file_is_loaded() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FILE_CONFIG);

    let config = HostConfig::load(Some(&path), ConfigOverrides::default()).unwrap();

    assert_eq!(config.gitlab_url, "https://gitlab.example.com");
    assert_eq!(config.token.as_deref(), Some("file-token"));
    assert_eq!(config.default_project().unwrap().as_str(), "platform/api");
    assert_eq!(config.retry_attempts, 5);
    assert_eq!(config.request_timeout_secs, 20, "missing keys keep defaults");
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let error = HostConfig::load(Some(&path), ConfigOverrides::default()).unwrap_err();

    assert!(matches!(error, ConfigError::IoError(_)), "got {:?}", error);
}

#[test]
#[serial]
fn test_malformed_file_is_a_parse_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "retry_attempts = \"many\"\n");

    let error = HostConfig::load(Some(&path), ConfigOverrides::default()).unwrap_err();

    assert!(matches!(error, ConfigError::ParseError(_)), "got {:?}", error);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FILE_CONFIG);
    set_env(ENV_GITLAB_TOKEN, "env-token");
    set_env(ENV_PROJECT_ID, "1234");
    set_env(ENV_GITLAB_URL, "");

    let config = HostConfig::load(Some(&path), ConfigOverrides::default()).unwrap();
    clear_env();

    assert_eq!(config.token.as_deref(), Some("env-token"));
    assert_eq!(config.project_id.as_deref(), Some("1234"));
    assert_eq!(
        config.gitlab_url, "https://gitlab.example.com",
        "empty environment values are ignored"
    );
}

#[test]
#[serial]
fn test_overrides_take_precedence_over_environment() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FILE_CONFIG);
    set_env(ENV_GITLAB_TOKEN, "env-token");

    let overrides = ConfigOverrides {
        gitlab_url: Some("http://localhost:8929".to_string()),
        token: Some("cli-token".to_string()),
        project_id: None,
    };
    let config = HostConfig::load(Some(&path), overrides).unwrap();
    clear_env();

    assert_eq!(config.gitlab_url, "http://localhost:8929");
    assert_eq!(config.token.as_deref(), Some("cli-token"));
    assert_eq!(config.project_id.as_deref(), Some("platform/api"));
}

#[test]
#[serial]
fn test_invalid_url_is_rejected() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "gitlab_url = \"ftp://gitlab.example.com\"\n");

    let error = HostConfig::load(Some(&path), ConfigOverrides::default()).unwrap_err();
    assert!(matches!(error, ConfigError::InvalidUrl(_)), "got {:?}", error);

    let overrides = ConfigOverrides {
        gitlab_url: Some("not a url".to_string()),
        ..Default::default()
    };
    let error = HostConfig::load(None, overrides).unwrap_err();
    assert!(matches!(error, ConfigError::InvalidUrl(_)), "got {:?}", error);
}

/// The default location is optional; when present it is read
#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_default_config_location() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let previous = std::env::var("XDG_CONFIG_HOME").ok();
    set_env("XDG_CONFIG_HOME", dir.path().to_str().unwrap());

    let config = HostConfig::load(None, ConfigOverrides::default()).unwrap();
    assert_eq!(config, HostConfig::default(), "absent default file is not an error");

    let app_dir = dir.path().join("gitlab-insight");
    fs::create_dir_all(&app_dir).unwrap();
    fs::write(app_dir.join("config.toml"), FILE_CONFIG).unwrap();

    let config = HostConfig::load(None, ConfigOverrides::default()).unwrap();

    match previous {
        Some(value) => set_env("XDG_CONFIG_HOME", &value),
        // SAFETY: serialized with the other environment tests
        None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
    }

    assert_eq!(config.gitlab_url, "https://gitlab.example.com");
    assert_eq!(config.retry_attempts, 5);
}
