//! Supervised background tasks.
//!
//! Background work (scene reconciliation, world ticks, log writes) must
//! never crash or block the turn path. The supervisor bounds concurrency
//! with a semaphore and catches every error at the task boundary: failures
//! are logged and dropped, by contract.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::warn;

use crate::error::Result;

/// Spawns fire-and-forget tasks under a concurrency cap.
#[derive(Debug, Clone)]
pub struct TaskSupervisor {
    permits: Arc<Semaphore>,
}

impl TaskSupervisor {
    /// Supervisor allowing at most `max_concurrent` tasks in flight.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Spawn a background task.
    ///
    /// The task waits for a permit before running, so a burst of background
    /// work queues instead of stampeding. Errors are logged under `label`
    /// and never propagated.
    pub fn spawn<F>(&self, label: &'static str, fut: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire().await else {
                // Semaphore closed: the process is shutting down.
                return;
            };
            if let Err(err) = fut.await {
                warn!(task = label, error = %err, "background task failed");
            }
        });
    }

    /// Permits currently available, for tests and introspection.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
