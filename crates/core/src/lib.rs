//! Cutline core session types and utilities

pub mod config;
pub mod error;
pub mod events;
pub mod jwt;
pub mod monitor;
pub mod navigation;
pub mod storage;
pub mod store;
pub mod task;
#[cfg(any(test, feature = "tests"))]
pub mod testing;

pub use config::{ApiConfig, CutlineConfig, SessionConfig};
pub use error::{CoreError, CoreResult};
pub use events::{SessionEvent, SessionEvents};
pub use jwt::{Claims, Clock, SystemClock};
pub use monitor::{MonitorOptions, SessionMonitor, TickOutcome};
pub use navigation::{MemoryNavigator, Navigator, Route};
pub use storage::{FileStorage, MemoryStorage, TokenStorage};
pub use store::TokenStore;
pub use task::TaskHandle;
