//! Cutline backend HTTP client
//!
//! Every request passes through two interceptors:
//!
//! - on send, the stored access token (if any) is attached as a bearer
//!   credential; no token means the request goes out unauthenticated;
//! - on a 401, the client trades the refresh token for a new access token and
//!   replays the request once. If that is impossible the tokens are cleared,
//!   the navigator is sent to the login screen and [`SessionEvent::Ended`] is
//!   emitted.

pub mod auth;
pub mod error;
pub mod request;
pub mod resources;

pub use error::ClientError;
pub use request::ApiRequest;

use crate::types::{RefreshRequest, RefreshResponse};
use cutline_core::{ApiConfig, MemoryNavigator, Navigator, Route, SessionEvent, SessionEvents, TokenStore};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Cutline API client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: TokenStore,
    navigator: Arc<dyn Navigator>,
    events: Option<SessionEvents>,
    refresh_lock: Option<Arc<tokio::sync::Mutex<()>>>,
}

impl ApiClient {
    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token store this client reads credentials from
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::put(path).json(body)?).await
    }

    /// Delete a resource, discarding any response body
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(ApiRequest::delete(path)).await.map(drop)
    }

    /// Send a request and decode its JSON body
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// Send a request through both interceptors and return the successful response
    pub async fn send(&self, mut request: ApiRequest) -> Result<Response, ClientError> {
        let (response, sent_with) = self.dispatch(&request).await?;

        if response.status() != StatusCode::UNAUTHORIZED
            || request.retried
            || request.skip_refresh
        {
            return Self::check(response).await;
        }

        let original = Self::error_from(response).await;
        request.retried = true;
        debug!(path = %request.path, "Got 401, attempting token refresh");

        let access = self.refreshed_access_token(sent_with, original).await?;
        request.bearer = Some(access);

        let (response, _) = self.dispatch(&request).await?;
        Self::check(response).await
    }

    /// Build and send one attempt. Returns the token that was attached.
    async fn dispatch(
        &self,
        request: &ApiRequest,
    ) -> Result<(Response, Option<String>), ClientError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let token = if request.anonymous {
            None
        } else {
            request
                .bearer
                .clone()
                .or_else(|| self.store.access_token())
        };
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(
            method = %request.method,
            path = %request.path,
            authenticated = token.is_some(),
            retried = request.retried,
            "Sending request"
        );
        Ok((builder.send().await?, token))
    }

    /// Obtain a fresh access token after a 401, or end the session
    async fn refreshed_access_token(
        &self,
        sent_with: Option<String>,
        original: ClientError,
    ) -> Result<String, ClientError> {
        let Some(lock) = &self.refresh_lock else {
            return self.refresh_access_token(original).await;
        };

        let _guard = lock.lock().await;
        match self.store.access_token() {
            Some(current) if sent_with.as_deref() != Some(current.as_str()) => {
                debug!("Access token already refreshed by a concurrent request");
                Ok(current)
            }
            _ => self.refresh_access_token(original).await,
        }
    }

    async fn refresh_access_token(&self, original: ClientError) -> Result<String, ClientError> {
        let Some(refresh) = self.store.refresh_token() else {
            warn!("No refresh token available, ending session");
            self.end_session();
            return Err(original);
        };

        match self.request_refresh(&refresh).await {
            Ok(tokens) => {
                match tokens.refresh.as_deref() {
                    Some(rotated) => self.store.set_tokens(&tokens.access, Some(rotated))?,
                    None => self.store.set_access_token(&tokens.access)?,
                }
                info!("Access token refreshed");
                Ok(tokens.access)
            }
            Err(e) => {
                warn!("Token refresh failed, ending session: {e}");
                self.end_session();
                Err(e)
            }
        }
    }

    /// Exchange the refresh token, bypassing both interceptors
    async fn request_refresh(&self, refresh: &str) -> Result<RefreshResponse, ClientError> {
        let request = ApiRequest::post(auth::REFRESH_PATH)
            .json(&RefreshRequest {
                refresh: refresh.to_string(),
            })?
            .anonymous()
            .skip_refresh();
        let (response, _) = self.dispatch(&request).await?;
        Ok(Self::check(response).await?.json().await?)
    }

    fn end_session(&self) {
        if let Err(e) = self.store.clear_tokens() {
            warn!("Failed to clear tokens: {e}");
        }
        self.navigator.navigate(Route::Login);
        if let Some(events) = &self.events {
            events.emit(SessionEvent::Ended);
        }
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn error_from(response: Response) -> ClientError {
        let status = response.status();
        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        ClientError::from_status(status, message)
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    store: Option<TokenStore>,
    navigator: Option<Arc<dyn Navigator>>,
    events: Option<SessionEvents>,
    coalesce_refresh: bool,
}

impl ApiClientBuilder {
    /// Apply every setting from a loaded configuration
    #[must_use]
    pub fn config(self, config: &ApiConfig) -> Self {
        self.base_url(&config.base_url)
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .coalesce_refresh(config.coalesce_refresh)
    }

    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Token store shared with the rest of the session
    #[must_use]
    pub fn store(mut self, store: TokenStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Navigator used to send the user to login when the session ends
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Bus told about sessions ended by a failed refresh
    #[must_use]
    pub fn events(mut self, events: SessionEvents) -> Self {
        self.events = Some(events);
        self
    }

    /// Serialize concurrent refreshes so a burst of 401s refreshes once
    #[must_use]
    pub fn coalesce_refresh(mut self, enabled: bool) -> Self {
        self.coalesce_refresh = enabled;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is empty".into()));
        }

        let client = ClientBuilder::new()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(
                self.user_agent
                    .unwrap_or_else(|| format!("cutline-client/{}", env!("CARGO_PKG_VERSION"))),
            )
            .build()?;

        Ok(ApiClient {
            client,
            base_url,
            store: self.store.unwrap_or_else(TokenStore::in_memory),
            navigator: self
                .navigator
                .unwrap_or_else(|| Arc::new(MemoryNavigator::default())),
            events: self.events,
            refresh_lock: self
                .coalesce_refresh
                .then(|| Arc::new(tokio::sync::Mutex::new(()))),
        })
    }
}
