//! Bounded fire-and-forget worker pool for the listener loops.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Number of concurrent workers per listener.
pub const DEFAULT_WORKERS: usize = 10;

/// Runs submitted tasks with a fixed concurrency bound. Submission never
/// blocks the caller: at most `capacity` tasks run at once, the rest queue
/// on the semaphore. Shutdown aborts queued and running tasks alike.
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    tasks: JoinSet<()>,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            tasks: JoinSet::new(),
        }
    }

    /// Submit one unit of work. Fire-and-forget: the caller never awaits
    /// its completion.
    pub fn submit<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = self.permits.clone();
        self.tasks.spawn(async move {
            // A closed semaphore means the pool is shutting down; the task
            // is abandoned, not an error.
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            task.await;
        });
        // Reap finished handles so the set does not grow without bound.
        while self.tasks.try_join_next().is_some() {}
    }

    /// Stop accepting queued work and abort everything in flight, without
    /// waiting for any task to drain.
    pub fn shutdown(&mut self) {
        self.permits.close();
        self.tasks.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrency_is_bounded() {
        let mut pool = WorkerPool::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..6 {
            let active = active.clone();
            let max_active = max_active.clone();
            let done = done.clone();
            pool.submit(async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::timeout(Duration::from_secs(5), async {
            while done.load(Ordering::SeqCst) < 6 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert!(max_active.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_abandons_queued_work() {
        let mut pool = WorkerPool::new(1);
        let started = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let started = started.clone();
            pool.submit(async move {
                started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
        }
        // Give the first task a moment to claim the only permit.
        tokio::time::sleep(Duration::from_millis(50)).await;
        pool.shutdown();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(started.load(Ordering::SeqCst) <= 1);
    }
}
