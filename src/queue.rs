//! Bounded job queue for callback-family compiles.

use std::sync::Arc;
use std::thread::available_parallelism;

use thiserror::Error;
use tokio::sync::Semaphore;

/// Failure to run a queued compile job.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("The worker pool is shut down")]
    Closed,

    #[error("The compile job panicked or was aborted.\n{0}")]
    Join(#[from] tokio::task::JoinError),
}

/// FIFO pool running synchronous compile jobs on blocking threads.
///
/// Callback-family compilers block a thread for the whole compile while
/// their import hook performs asynchronous resolution on the runtime. The
/// pool is sized one below the available parallelism so at least one thread
/// is always left to service that resolution I/O; admission order is
/// preserved, jobs beyond the limit simply wait their turn. One pool is
/// owned by each [`Bridge`](crate::Bridge) and lives as long as it does.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl WorkerPool {
    pub fn new() -> Self {
        let workers = available_parallelism().map(|n| n.get()).unwrap_or(2);
        Self::with_limit(workers.saturating_sub(1).max(1))
    }

    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run one job to completion on a blocking thread, waiting for a free
    /// slot first.
    pub async fn run<T, F>(&self, job: F) -> Result<T, QueueError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| QueueError::Closed)?;

        let handle = tokio::task::spawn_blocking(move || {
            let out = job();
            drop(permit);
            out
        });

        Ok(handle.await?)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}
