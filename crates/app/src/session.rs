//! One authenticated session and everything that shares its tokens

use crate::auth::{AuthContext, AuthStatus, AutoAcknowledge, ExpiryPrompt, SessionExpiredGate};
use cutline_core::{
    Clock, CutlineConfig, MemoryNavigator, MemoryStorage, MonitorOptions, Navigator,
    SessionEvents, SessionMonitor, SystemClock, TaskHandle, TokenStorage, TokenStore,
};
use cutline_http::{ApiClient, ClientError};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Builder for [`Session`]
pub struct SessionBuilder {
    config: CutlineConfig,
    storage: Option<Arc<dyn TokenStorage>>,
    navigator: Option<Arc<dyn Navigator>>,
    prompt: Option<Arc<dyn ExpiryPrompt>>,
    clock: Option<Arc<dyn Clock>>,
}

impl SessionBuilder {
    pub fn new(config: CutlineConfig) -> Self {
        Self {
            config,
            storage: None,
            navigator: None,
            prompt: None,
            clock: None,
        }
    }

    /// Token storage scope. Defaults to a fresh in-memory scope.
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Prompt shown when the session expires
    #[must_use]
    pub fn prompt(mut self, prompt: Arc<dyn ExpiryPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Clock the expiry monitor compares tokens against
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Session, ClientError> {
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(MemoryNavigator::default()));
        let prompt = self.prompt.unwrap_or_else(|| Arc::new(AutoAcknowledge));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let store = TokenStore::new(storage);
        let events = SessionEvents::new();

        let client = ApiClient::builder()
            .config(&self.config.api)
            .store(store.clone())
            .navigator(navigator.clone())
            .events(events.clone())
            .build()?;

        let auth = Arc::new(AuthContext::new(
            client.clone(),
            events.clone(),
            navigator.clone(),
        ));

        let monitor = Arc::new(SessionMonitor::with_clock(
            store.clone(),
            events.clone(),
            MonitorOptions {
                interval: self.config.session.poll_interval(),
                ..MonitorOptions::default()
            },
            clock,
        ));

        let gate = Arc::new(SessionExpiredGate::new(navigator.clone(), prompt));

        debug!(base_url = %client.base_url(), "Session assembled");

        Ok(Session {
            config: self.config,
            store,
            events,
            client,
            navigator,
            auth,
            monitor,
            gate,
            tasks: Mutex::new(Vec::new()),
        })
    }
}

/// Token store, event bus, HTTP client, auth context, monitor and gate for
/// one user session
pub struct Session {
    config: CutlineConfig,
    store: TokenStore,
    events: SessionEvents,
    client: ApiClient,
    navigator: Arc<dyn Navigator>,
    auth: Arc<AuthContext>,
    monitor: Arc<SessionMonitor>,
    gate: Arc<SessionExpiredGate>,
    tasks: Mutex<Vec<TaskHandle>>,
}

impl Session {
    pub fn builder(config: CutlineConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    /// Seed the auth state, then start the auth sync, expiry monitor and gate
    ///
    /// Calling this again restarts the background tasks.
    pub async fn init(&self) -> AuthStatus {
        let status = self.auth.init().await;

        let sync = self.auth.clone().spawn(&self.events);
        let gate = self.gate.clone().spawn(&self.events);
        let monitor = self.monitor.clone().spawn();
        let previous = std::mem::replace(&mut *self.lock_tasks(), vec![sync, gate, monitor]);
        drop(previous);

        info!(?status, "Session initialized");
        status
    }

    /// Stop the background tasks
    pub async fn teardown(&self) {
        let tasks = std::mem::take(&mut *self.lock_tasks());
        for task in tasks {
            task.shutdown().await;
        }
        debug!("Session torn down");
    }

    /// Whether the background tasks are running
    pub fn is_running(&self) -> bool {
        self.lock_tasks().iter().any(TaskHandle::is_running)
    }

    pub fn config(&self) -> &CutlineConfig {
        &self.config
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn monitor(&self) -> &SessionMonitor {
        &self.monitor
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<TaskHandle>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
