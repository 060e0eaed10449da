//! Polling session-expiry monitor
//!
//! Expiry is a pure function of wall-clock time, so the monitor simply polls
//! the token store on a fixed interval. Once an expiry has been broadcast the
//! `notified` guard suppresses further broadcasts until the tokens disappear
//! (a clean logout), which re-arms the monitor for the next login.

use crate::events::{SessionEvent, SessionEvents};
use crate::jwt::{self, Clock, SystemClock};
use crate::store::TokenStore;
use crate::task::TaskHandle;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Default polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(30_000);

/// Monitor construction options
#[derive(Debug, Clone, Copy)]
pub struct MonitorOptions {
    /// Time between checks. The first check runs immediately.
    pub interval: Duration,
    /// Initial value of the "expiry already broadcast" guard
    pub notified: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            notified: false,
        }
    }
}

/// What a single check observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No access token is stored
    Idle,
    /// A live token is stored
    Watching,
    /// The token is still stored but its expiry was already broadcast
    AlreadyNotified,
    /// The token expired on this tick; tokens were cleared and the event sent
    Expired,
}

/// Watches the token store for access-token expiry
pub struct SessionMonitor {
    store: TokenStore,
    events: SessionEvents,
    clock: Arc<dyn Clock>,
    interval: Duration,
    notified: AtomicBool,
}

impl SessionMonitor {
    pub fn new(store: TokenStore, events: SessionEvents, options: MonitorOptions) -> Self {
        Self::with_clock(store, events, options, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: TokenStore,
        events: SessionEvents,
        options: MonitorOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            events,
            clock,
            interval: options.interval,
            notified: AtomicBool::new(options.notified),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether an expiry has been broadcast and not yet re-armed
    pub fn is_notified(&self) -> bool {
        self.notified.load(Ordering::SeqCst)
    }

    /// Run one check
    pub fn tick(&self) -> TickOutcome {
        let Some(token) = self.store.access_token() else {
            if self.notified.swap(false, Ordering::SeqCst) {
                debug!("Tokens gone, session monitor re-armed");
            }
            return TickOutcome::Idle;
        };

        if self.is_notified() {
            return TickOutcome::AlreadyNotified;
        }

        if !jwt::is_expired(&token, self.clock.as_ref()) {
            return TickOutcome::Watching;
        }

        if let Err(e) = self.store.clear_tokens() {
            warn!("Failed to clear expired tokens: {e}");
        }
        self.notified.store(true, Ordering::SeqCst);
        info!("Access token expired, broadcasting session expiry");
        self.events.emit(SessionEvent::Expired);
        TickOutcome::Expired
    }

    /// Start polling on the current tokio runtime
    ///
    /// The returned handle owns the timer; dropping it stops polling.
    pub fn spawn(self: Arc<Self>) -> TaskHandle {
        TaskHandle::spawn("session-monitor", move |cancel| async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        self.tick();
                    }
                }
            }
        })
    }
}
