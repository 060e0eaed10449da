//! Wire types exchanged with the backend

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Login credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login response. The backend names the access token either `access_token`
/// or `access`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,

    #[serde(default, alias = "refresh_token", skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl LoginResponse {
    /// The access token under whichever name the server used
    pub fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .or(self.access.as_deref())
            .filter(|token| !token.is_empty())
    }
}

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Token refresh response. Servers that rotate refresh tokens send a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

/// Server-side logout request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// Profile of the logged-in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: JsonValue,

    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub is_superuser: bool,

    /// Any further fields the backend sends
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl UserProfile {
    /// Case-insensitive role check
    pub fn has_role(&self, role: &str) -> bool {
        self.role
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(role))
    }

    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.has_role("admin")
    }
}

/// One page of a resource listing
///
/// Accepts both the paginated envelope `{count, next, previous, results}` and
/// a bare JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "Listing<T>",
    bound(deserialize = "T: Deserialize<'de>", serialize = "T: Serialize")
)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Paginated {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Plain(Vec<T>),
}

impl<T> From<Listing<T>> for Page<T> {
    fn from(listing: Listing<T>) -> Self {
        match listing {
            Listing::Paginated {
                count,
                next,
                previous,
                results,
            } => Self {
                count: count.unwrap_or(results.len() as u64),
                next,
                previous,
                results,
            },
            Listing::Plain(results) => Self {
                count: results.len() as u64,
                next: None,
                previous: None,
                results,
            },
        }
    }
}
