//! Cutline session wiring for front ends
//!
//! [`Session`] owns one token store, one event bus and every component that
//! shares them. Nothing here is global, so several sessions can live in the
//! same process.

pub mod auth;
pub mod session;

pub use auth::{
    AuthContext, AuthState, AuthStatus, AutoAcknowledge, EXPIRED_MESSAGE, ExpiryPrompt,
    SessionExpiredGate,
};
pub use session::{Session, SessionBuilder};
