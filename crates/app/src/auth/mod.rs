//! Authentication state and the session-expired gate

pub mod context;
pub mod gate;

pub use context::{AuthContext, AuthState, AuthStatus};
pub use gate::{AutoAcknowledge, EXPIRED_MESSAGE, ExpiryPrompt, SessionExpiredGate};
