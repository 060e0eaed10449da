//! Helpers for exercising session code under test

use crate::jwt::Clock;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value as JsonValue, json};
use std::sync::atomic::{AtomicI64, Ordering};

/// Manually driven clock
#[derive(Debug)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Build an unsigned JWT carrying `claims`
pub fn unsigned_token_with(claims: &JsonValue) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.")
}

/// Build an unsigned JWT expiring at `exp`
pub fn unsigned_token(exp: i64) -> String {
    unsigned_token_with(&json!({ "sub": "1", "exp": exp }))
}

/// Unsigned JWT expiring an hour from now
pub fn fresh_token() -> String {
    unsigned_token(chrono::Utc::now().timestamp() + 3600)
}

/// Unsigned JWT that expired a minute ago
pub fn stale_token() -> String {
    unsigned_token(chrono::Utc::now().timestamp() - 60)
}
