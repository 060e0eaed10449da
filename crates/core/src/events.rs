//! Session-wide event bus

use tokio::sync::broadcast;
use tracing::trace;

const CHANNEL_CAPACITY: usize = 16;

/// Events observable by every component of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The stored access token expired and was cleared
    Expired,
    /// A login completed
    LoggedIn,
    /// The session was ended locally
    LoggedOut,
    /// A 401 could not be recovered by refreshing; tokens were cleared
    Ended,
}

/// Broadcast bus for [`SessionEvent`]s
///
/// Cloning shares the underlying channel.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn emit(&self, event: SessionEvent) {
        let receivers = self.sender.send(event).unwrap_or(0);
        trace!(?event, receivers, "Session event emitted");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
