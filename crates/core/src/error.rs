//! Errors raised by configuration and token storage

use std::path::PathBuf;

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading or writing the token storage failed
    #[error("Token storage unavailable: {0}")]
    Storage(String),

    /// The token file exists but does not hold a JSON object of strings
    #[error("Token file {} is unreadable: {reason}", .path.display())]
    CorruptTokenFile { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

impl From<toml::ser::Error> for CoreError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
