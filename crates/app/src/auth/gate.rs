//! Session-expired gate
//!
//! Listens for [`SessionEvent::Expired`] and, unless the user is already on
//! the login screen, blocks on an acknowledgment before sending them there.

use async_trait::async_trait;
use cutline_core::{Navigator, Route, SessionEvent, SessionEvents, TaskHandle};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Text shown when the session runs out
pub const EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Blocking acknowledgment shown to the user
#[async_trait]
pub trait ExpiryPrompt: Send + Sync {
    /// Resolve once the user has confirmed the message
    async fn acknowledge(&self, message: &str);
}

/// Prompt that confirms immediately, for non-interactive front ends
#[derive(Debug, Default)]
pub struct AutoAcknowledge;

#[async_trait]
impl ExpiryPrompt for AutoAcknowledge {
    async fn acknowledge(&self, message: &str) {
        info!("{message}");
    }
}

pub struct SessionExpiredGate {
    navigator: Arc<dyn Navigator>,
    prompt: Arc<dyn ExpiryPrompt>,
}

impl SessionExpiredGate {
    pub fn new(navigator: Arc<dyn Navigator>, prompt: Arc<dyn ExpiryPrompt>) -> Self {
        Self { navigator, prompt }
    }

    /// React to one event. Returns whether the user was sent to login.
    pub async fn handle(&self, event: SessionEvent) -> bool {
        if event != SessionEvent::Expired {
            return false;
        }
        if self.navigator.current() == Route::Login {
            debug!("Session expired while on the login screen, no prompt");
            return false;
        }

        self.prompt.acknowledge(EXPIRED_MESSAGE).await;
        self.navigator.navigate(Route::Login);
        true
    }

    /// Listen on `events` until the handle is dropped or shut down
    pub fn spawn(self: Arc<Self>, events: &SessionEvents) -> TaskHandle {
        let mut rx = events.subscribe();
        TaskHandle::spawn("session-expired-gate", move |cancel| async move {
            loop {
                let event = tokio::select! {
                    () = cancel.cancelled() => break,
                    event = rx.recv() => event,
                };
                match event {
                    Ok(event) => {
                        tokio::select! {
                            () = cancel.cancelled() => break,
                            _ = self.handle(event) => {}
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session expired gate lagged behind events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
