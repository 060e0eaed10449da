//! Errors surfaced by [`ApiClient`](super::ApiClient)

use cutline_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Network, timeout or body decoding error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Any other non-success status
    #[error("Backend returned {status}: {message}")]
    ServerError { status: u16, message: String },

    /// 401, after any refresh attempt
    #[error("Not authenticated: {0}")]
    AuthenticationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 400, typically a validation failure
    #[error("Rejected by backend: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Could not encode request body: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Client misconfigured: {0}")]
    Configuration(String),

    /// The server answered successfully but with an unusable body
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Token storage failed
    #[error("Token storage error: {0}")]
    Storage(#[from] CoreError),
}

impl ClientError {
    /// Map a non-success status to its variant
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// HTTP status this error was built from, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::ServerError { status, .. } => Some(*status),
            Self::AuthenticationFailed(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::BadRequest(_) => Some(400),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }
}
