//! Deferred work
//!
//! Archive expansion, deletions and transient-file cleanup run here after
//! the response that triggered them has been produced. Failures are logged
//! in one place; callers can wait for the queue to drain.

use log::{debug, error};
use std::future::Future;
use tokio_util::task::TaskTracker;

use crate::error::ServerError;

#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task`; an `Err` outcome is logged under `label`.
    pub fn submit<F>(&self, label: impl Into<String>, task: F)
    where
        F: Future<Output = Result<(), ServerError>> + Send + 'static,
    {
        let label = label.into();
        debug!("Scheduling background task: {}", label);
        self.tracker.spawn(async move {
            match task.await {
                Ok(()) => debug!("Background task finished: {}", label),
                Err(e) => error!("Background task {} failed: {}", label, e),
            }
        });
    }

    /// Number of tasks still running.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every task submitted so far (and any they submit) is done.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn wait_idle_observes_completion() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = Arc::clone(&done);
            tasks.submit("count", async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        tasks.submit("fails", async {
            Err(StorageError::NotFound("x".into()).into())
        });

        tasks.wait_idle().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(tasks.pending(), 0);

        // Still accepts work afterwards.
        let done2 = Arc::clone(&done);
        tasks.submit("again", async move {
            done2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        tasks.wait_idle().await;
        assert_eq!(done.load(Ordering::SeqCst), 4);
    }
}
