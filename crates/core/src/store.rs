//! Access/refresh token store

use crate::error::CoreResult;
use crate::storage::{MemoryStorage, TokenStorage};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Holds at most one access token and one refresh token
///
/// A thin wrapper over a [`TokenStorage`] scope. Token contents are never
/// inspected here; see [`crate::jwt`] for that.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self { storage }
    }

    /// Store backed by a fresh [`MemoryStorage`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Replace both tokens. A missing refresh token removes the stored one.
    pub fn set_tokens(&self, access: &str, refresh: Option<&str>) -> CoreResult<()> {
        self.storage.set(ACCESS_TOKEN_KEY, access)?;
        match refresh {
            Some(refresh) => self.storage.set(REFRESH_TOKEN_KEY, refresh)?,
            None => self.storage.remove(REFRESH_TOKEN_KEY)?,
        }
        debug!(has_refresh = refresh.is_some(), "Stored session tokens");
        Ok(())
    }

    /// Replace only the access token, keeping the refresh token
    pub fn set_access_token(&self, access: &str) -> CoreResult<()> {
        self.storage.set(ACCESS_TOKEN_KEY, access)
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(REFRESH_TOKEN_KEY)
    }

    /// Remove both tokens. Safe to call when nothing is stored.
    pub fn clear_tokens(&self) -> CoreResult<()> {
        self.storage.remove(ACCESS_TOKEN_KEY)?;
        self.storage.remove(REFRESH_TOKEN_KEY)?;
        debug!("Cleared session tokens");
        Ok(())
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_access", &self.access_token().is_some())
            .field("has_refresh", &self.refresh_token().is_some())
            .finish()
    }
}
