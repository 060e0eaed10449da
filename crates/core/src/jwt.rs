//! Unverified JWT inspection
//!
//! Tokens are decoded client-side only to read the payload claims, chiefly
//! `exp`. Signatures are never checked: the server remains the authority on
//! token validity and these helpers are a UX hint, not a security boundary.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::{Map, Value as JsonValue};

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Source of the current Unix time in seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Decoded JWT payload claims
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    inner: Map<String, JsonValue>,
}

impl Claims {
    /// Expiry as Unix seconds, if present and numeric
    pub fn exp(&self) -> Option<f64> {
        self.inner.get("exp").and_then(JsonValue::as_f64)
    }

    /// The `sub` claim
    pub fn subject(&self) -> Option<&str> {
        self.inner.get("sub").and_then(JsonValue::as_str)
    }

    /// Roles carried by the token, from `roles` (array) or `role` (string)
    pub fn roles(&self) -> Vec<&str> {
        match self.inner.get("roles") {
            Some(JsonValue::Array(items)) => items.iter().filter_map(JsonValue::as_str).collect(),
            _ => self
                .inner
                .get("role")
                .and_then(JsonValue::as_str)
                .into_iter()
                .collect(),
        }
    }

    /// Gets a claim value by key
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.inner.get(key)
    }

    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.inner
    }
}

/// Decode the payload segment of a JWT without verifying it.
///
/// Returns `None` for anything that is not `<header>.<payload>[.<sig>]` with a
/// base64 JSON object as payload.
pub fn decode(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    if payload.is_empty() {
        return None;
    }

    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .or_else(|_| STANDARD_LENIENT.decode(payload))
        .ok()?;

    match serde_json::from_slice::<JsonValue>(&bytes).ok()? {
        JsonValue::Object(inner) => Some(Claims { inner }),
        _ => None,
    }
}

/// Whether the token is expired at Unix time `now`.
///
/// Undecodable tokens and tokens without a numeric `exp` count as expired.
pub fn is_expired_at(token: &str, now: i64) -> bool {
    #[allow(clippy::cast_precision_loss)]
    let now = now as f64;
    decode(token)
        .and_then(|claims| claims.exp())
        .is_none_or(|exp| now >= exp)
}

/// Whether the token is expired according to `clock`
pub fn is_expired(token: &str, clock: &dyn Clock) -> bool {
    is_expired_at(token, clock.now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn token(payload: &JsonValue) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn decodes_payload_claims() {
        let t = token(&json!({"sub": "42", "exp": NOW, "roles": ["admin", "staff"]}));
        let claims = decode(&t).unwrap();

        assert_eq!(claims.subject(), Some("42"));
        #[allow(clippy::cast_precision_loss)]
        let expected = NOW as f64;
        assert_eq!(claims.exp(), Some(expected));
        assert_eq!(claims.roles(), vec!["admin", "staff"]);
    }

    #[test]
    fn single_role_claim_is_read() {
        let t = token(&json!({"role": "operator"}));
        assert_eq!(decode(&t).unwrap().roles(), vec!["operator"]);
    }

    #[test]
    fn accepts_padded_standard_alphabet() {
        let payload = json!({"exp": NOW, "name": "ñandú??>>"}).to_string();
        let t = format!("h.{}.s", STANDARD.encode(payload));
        assert!(decode(&t).is_some());
    }

    #[test]
    fn malformed_tokens_decode_to_none() {
        let array_payload = format!("a.{}.c", URL_SAFE_NO_PAD.encode("[1,2]"));
        for bad in ["", "abc", "a..c", "a.!!!.c", array_payload.as_str()] {
            assert!(decode(bad).is_none(), "{bad:?} should not decode");
        }
    }

    #[test]
    fn malformed_or_expless_tokens_are_expired() {
        assert!(is_expired_at("garbage", NOW));
        assert!(is_expired_at(&token(&json!({"sub": "1"})), NOW));
        assert!(is_expired_at(&token(&json!({"exp": "soon"})), NOW));
    }

    #[test]
    fn expiry_boundaries() {
        assert!(is_expired_at(&token(&json!({"exp": NOW - 1})), NOW));
        assert!(is_expired_at(&token(&json!({"exp": NOW})), NOW));
        assert!(!is_expired_at(&token(&json!({"exp": NOW + 3600})), NOW));
    }

    #[test]
    fn system_clock_drives_is_expired() {
        let far_future = token(&json!({"exp": 32_503_680_000_i64}));
        assert!(!is_expired(&far_future, &SystemClock));
        assert!(is_expired(&token(&json!({"exp": 1})), &SystemClock));
    }
}
