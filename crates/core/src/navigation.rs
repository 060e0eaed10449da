//! Screen navigation seam

use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Application screens the session layer cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
    Path(String),
}

impl Route {
    pub fn path(&self) -> &str {
        match self {
            Self::Login => "/login",
            Self::Home => "/",
            Self::Path(path) => path,
        }
    }

    /// Parse a path, folding well-known paths into their variants
    pub fn from_path(path: &str) -> Self {
        match path {
            "/login" | "/login/" => Self::Login,
            "" | "/" => Self::Home,
            other => Self::Path(other.to_string()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Moves the user between screens
pub trait Navigator: Send + Sync {
    /// Screen currently shown
    fn current(&self) -> Route;

    fn navigate(&self, route: Route);
}

/// Navigator that only records where it was sent
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl MemoryNavigator {
    pub fn new(start: Route) -> Self {
        Self {
            history: Mutex::new(vec![start]),
        }
    }

    /// Every route visited, starting route first
    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}

impl Navigator for MemoryNavigator {
    fn current(&self) -> Route {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or(Route::Home)
    }

    fn navigate(&self, route: Route) {
        debug!(%route, "Navigating");
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}
