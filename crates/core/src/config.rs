//! Client configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `CUTLINE__*` environment variables (`__` separates sections, e.g.
//! `CUTLINE__API__BASE_URL`).

use crate::error::{CoreError, CoreResult};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the data directory
pub const STATE_DIR_ENV: &str = "CUTLINE_STATE_DIR";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutlineConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL, e.g. `https://workshop.example.com/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Serialize concurrent token refreshes into one
    #[serde(default)]
    pub coalesce_refresh: bool,
}

/// Session lifecycle settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Expiry polling interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Token file; defaults to `session.json` in the data directory
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("cutline-client/{}", env!("CARGO_PKG_VERSION"))
}

fn default_poll_interval_ms() -> u64 {
    30_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            coalesce_refresh: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            token_file: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SessionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Resolve the token file against a data directory
    pub fn token_file(&self, data_dir: &Path) -> PathBuf {
        self.token_file
            .clone()
            .unwrap_or_else(|| data_dir.join("session.json"))
    }
}

impl CutlineConfig {
    /// Load defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("CUTLINE")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the backend client cannot work without
    pub fn validate(&self) -> CoreResult<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| {
            CoreError::invalid_config(format!("api.base_url '{}': {e}", self.api.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::invalid_config(format!(
                "api.base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(CoreError::invalid_config("api.timeout_secs must be positive"));
        }
        if self.session.poll_interval_ms == 0 {
            return Err(CoreError::invalid_config(
                "session.poll_interval_ms must be positive",
            ));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> CoreResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Directory for tokens and logs
pub fn default_data_dir() -> PathBuf {
    std::env::var(STATE_DIR_ENV).map_or_else(
        |_| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cutline")
        },
        PathBuf::from,
    )
}
