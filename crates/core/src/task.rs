//! Ownership of background session tasks

use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Owner of a spawned background task
///
/// The task receives a [`CancellationToken`] and must stop when it fires.
/// Dropping the handle cancels the task, so timers never outlive their owner.
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Spawn `f` on the current tokio runtime
    pub fn spawn<F, Fut>(name: &'static str, f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(f(cancel.clone()));
        debug!(task = name, "Background task started");

        Self {
            name,
            cancel,
            task: Some(task),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the task and wait for it to finish
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(task = self.name, "Background task ended abnormally: {e}");
            }
        }
        debug!(task = self.name, "Background task stopped");
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
