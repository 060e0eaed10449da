//! Replayable request description
//!
//! `reqwest::RequestBuilder` is consumed on send, so requests are described
//! here and rebuilt for every attempt. The `retried` flag travels with the
//! request and caps refresh-and-retry at one round.

use super::ClientError;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// A request to the backend, relative to the client's base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<JsonValue>,
    pub(crate) bearer: Option<String>,
    pub(crate) anonymous: bool,
    pub(crate) skip_refresh: bool,
    pub(crate) retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };

        Self {
            method,
            path,
            query: Vec::new(),
            body: None,
            bearer: None,
            anonymous: false,
            skip_refresh: false,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append query-string pairs
    #[must_use]
    pub fn query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Send without the stored access token
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Send with `token` instead of the stored access token
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Never attempt the refresh-and-retry dance for this request
    #[must_use]
    pub fn skip_refresh(mut self) -> Self {
        self.skip_refresh = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether this request already went through a refresh
    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paths_are_rooted() {
        assert_eq!(ApiRequest::get("products/").path(), "/products/");
        assert_eq!(ApiRequest::get("/products/").path(), "/products/");
    }

    #[test]
    fn builder_collects_parts() {
        let request = ApiRequest::post("/users/login/")
            .query([("a", "1")])
            .json(&json!({"username": "ana"}))
            .unwrap()
            .anonymous()
            .skip_refresh();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.query, vec![("a".to_string(), "1".to_string())]);
        assert_eq!(request.body, Some(json!({"username": "ana"})));
        assert!(request.anonymous && request.skip_refresh && !request.is_retried());
    }

    #[test]
    fn explicit_bearer_is_kept() {
        let request = ApiRequest::get("/users/profile/").bearer("fresh");
        assert_eq!(request.bearer.as_deref(), Some("fresh"));
        assert!(!request.anonymous);
    }
}
