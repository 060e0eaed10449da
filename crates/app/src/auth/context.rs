//! Process-wide authentication state

use cutline_core::{Navigator, Route, SessionEvent, SessionEvents, TaskHandle, TokenStore};
use cutline_http::{ApiClient, ClientError, Credentials, UserProfile};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tracing::{info, warn};

/// Where the auth lifecycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Stored credentials are still being validated
    Initializing,
    Authenticated,
    Unauthenticated,
}

/// Authentication state
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub status: AuthStatus,
    pub user: Option<UserProfile>,
}

impl AuthState {
    fn initializing() -> Self {
        Self {
            status: AuthStatus::Initializing,
            user: None,
        }
    }

    fn authenticated(user: UserProfile) -> Self {
        Self {
            status: AuthStatus::Authenticated,
            user: Some(user),
        }
    }

    fn unauthenticated() -> Self {
        Self {
            status: AuthStatus::Unauthenticated,
            user: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.status == AuthStatus::Initializing
    }
}

/// Current user plus login/logout
///
/// State changes are published on a watch channel; see [`AuthContext::subscribe`].
pub struct AuthContext {
    client: ApiClient,
    store: TokenStore,
    events: SessionEvents,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<AuthState>,
}

impl AuthContext {
    pub fn new(
        client: ApiClient,
        events: SessionEvents,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let store = client.store().clone();
        let (state, _) = watch::channel(AuthState::initializing());
        Self {
            client,
            store,
            events,
            navigator,
            state,
        }
    }

    /// Validate stored credentials against the profile endpoint
    pub async fn init(&self) -> AuthStatus {
        if self.store.access_token().is_none() {
            self.state.send_replace(AuthState::unauthenticated());
            return AuthStatus::Unauthenticated;
        }

        match self.client.profile().await {
            Ok(user) => {
                info!(username = %user.username, "Restored session");
                self.state.send_replace(AuthState::authenticated(user));
                AuthStatus::Authenticated
            }
            Err(e) => {
                warn!("Stored session is no longer valid: {e}");
                self.logout().await;
                AuthStatus::Unauthenticated
            }
        }
    }

    /// Log in and move to the home screen
    ///
    /// On failure the auth state and stored tokens are left as they were.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, ClientError> {
        let response = self.client.login(credentials).await?;
        let access = response
            .access_token()
            .ok_or_else(|| {
                ClientError::InvalidResponse(
                    "login response did not include an access token".into(),
                )
            })?
            .to_string();

        let user = match response.user {
            Some(user) => user,
            None => self.client.profile_for_token(&access).await?,
        };

        self.store.set_tokens(&access, response.refresh.as_deref())?;

        info!(username = %user.username, "Logged in");
        self.state.send_replace(AuthState::authenticated(user.clone()));
        self.events.emit(SessionEvent::LoggedIn);
        self.navigator.navigate(Route::Home);
        Ok(user)
    }

    /// End the session locally, telling the server when it is reachable
    pub async fn logout(&self) {
        let refresh = self.store.refresh_token();
        if let Err(e) = self.client.logout(refresh.as_deref()).await {
            warn!("Server-side logout failed, continuing locally: {e}");
        }

        if let Err(e) = self.store.clear_tokens() {
            warn!("Failed to clear tokens on logout: {e}");
        }
        self.state.send_replace(AuthState::unauthenticated());
        self.events.emit(SessionEvent::LoggedOut);
        self.navigator.navigate(Route::Login);
        info!("Logged out");
    }

    /// Drop the user when the session was destroyed elsewhere
    ///
    /// Returns whether the state changed.
    pub fn handle_event(&self, event: SessionEvent) -> bool {
        if !matches!(event, SessionEvent::Expired | SessionEvent::Ended) {
            return false;
        }

        let changed = self.state.send_if_modified(|state| {
            if state.status == AuthStatus::Unauthenticated {
                return false;
            }
            *state = AuthState::unauthenticated();
            true
        });
        if changed {
            info!(?event, "Session ended outside of logout");
        }
        changed
    }

    /// Follow `events` until the handle is dropped or shut down
    pub fn spawn(self: Arc<Self>, events: &SessionEvents) -> TaskHandle {
        let mut rx = events.subscribe();
        TaskHandle::spawn("auth-state-sync", move |cancel| async move {
            loop {
                let event = tokio::select! {
                    () = cancel.cancelled() => break,
                    event = rx.recv() => event,
                };
                match event {
                    Ok(event) => {
                        self.handle_event(event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth state sync lagged behind events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Role gate for features restricted to certain users
    pub fn has_role(&self, role: &str) -> bool {
        self.state
            .borrow()
            .user
            .as_ref()
            .is_some_and(|user| user.has_role(role))
    }

    pub fn is_admin(&self) -> bool {
        self.state
            .borrow()
            .user
            .as_ref()
            .is_some_and(UserProfile::is_admin)
    }
}
