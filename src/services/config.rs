//! Host configuration loading
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! environment variables, then explicit overrides from the command line.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::gitlab::transport::TransportPolicy;
use crate::types::ProjectId;

pub const ENV_GITLAB_URL: &str = "GITLAB_INSIGHT_URL";
pub const ENV_GITLAB_TOKEN: &str = "GITLAB_INSIGHT_TOKEN";
pub const ENV_PROJECT_ID: &str = "GITLAB_INSIGHT_PROJECT_ID";

pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";

/// Connection settings for one GitLab instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub gitlab_url: String,
    pub token: Option<String>,
    /// Project used when a tool call does not name one
    pub project_id: Option<String>,
    /// Skip TLS certificate verification, for self-hosted instances with private CAs
    pub accept_invalid_certs: bool,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_backoff_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            gitlab_url: DEFAULT_GITLAB_URL.to_string(),
            token: None,
            project_id: None,
            accept_invalid_certs: false,
            connect_timeout_secs: 10,
            request_timeout_secs: 20,
            retry_attempts: 3,
            retry_backoff_secs: 2,
        }
    }
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub gitlab_url: Option<String>,
    pub token: Option<String>,
    pub project_id: Option<String>,
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Reading the configuration file failed
    IoError(String),
    /// The configuration file is not valid TOML for `HostConfig`
    ParseError(String),
    /// The GitLab base URL is unusable
    InvalidUrl(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(msg) => write!(f, "IO error: {}", msg),
            Self::ParseError(msg) => write!(f, "Config parse error: {}", msg),
            Self::InvalidUrl(msg) => write!(f, "Invalid GitLab URL: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Default location of the configuration file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gitlab-insight").join("config.toml"))
}

impl HostConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Reads a TOML file. Keys missing from the file keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Full layered load.
    ///
    /// An explicit `config_path` must exist. The default path is optional and
    /// silently skipped when absent.
    pub fn load(
        config_path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    tracing::debug!("Loading configuration from {}", path.display());
                    Self::from_file(&path)?
                }
                _ => Self::default(),
            },
        };

        let config = config
            .with_env(|key| std::env::var(key).ok())
            .with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Applies environment values, looked up through `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_GITLAB_URL) {
            self.gitlab_url = url;
        }
        if let Some(token) = non_empty(ENV_GITLAB_TOKEN) {
            self.token = Some(token);
        }
        if let Some(project_id) = non_empty(ENV_PROJECT_ID) {
            self.project_id = Some(project_id);
        }
        self
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.gitlab_url {
            self.gitlab_url = url;
        }
        if let Some(token) = overrides.token {
            self.token = Some(token);
        }
        if let Some(project_id) = overrides.project_id {
            self.project_id = Some(project_id);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.gitlab_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", self.gitlab_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ConfigError::InvalidUrl(format!(
                "'{}': unsupported scheme '{}'",
                self.gitlab_url, scheme
            ))),
        }
    }

    pub fn default_project(&self) -> Option<ProjectId> {
        self.project_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(ProjectId::from)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn transport_policy(&self) -> TransportPolicy {
        TransportPolicy {
            max_attempts: self.retry_attempts.max(1),
            backoff: Duration::from_secs(self.retry_backoff_secs),
            attempt_timeout: self.request_timeout(),
        }
    }
}
