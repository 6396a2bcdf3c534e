//! Bounded worker pool for CPU-bound optimization jobs
//!
//! Jobs run on tokio's blocking threads, but never more than `workers` at a
//! time. At most `workers + queue_limit` jobs may be admitted (running or
//! waiting); beyond that `dispatch` fails fast instead of queueing. Every job
//! gets a `CancellationToken` that fires when its deadline passes or the pool
//! shuts down; jobs are expected to poll it and return early.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Worker pool sizing and deadline
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Jobs allowed to run concurrently
    pub workers: usize,
    /// Jobs allowed to wait for a worker
    pub queue_limit: usize,
    /// Deadline covering queue wait and execution
    pub timeout: Duration,
}

/// Error type for dispatch operations
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Running and queued jobs are at capacity
    #[error("worker pool saturated")]
    Saturated,

    #[error("job did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("worker job failed: {0}")]
    Failed(String),
}

/// Bounded, cancellable job dispatcher
#[derive(Clone)]
pub struct WorkerPool {
    admission: Arc<Semaphore>,
    workers: Arc<Semaphore>,
    config: PoolConfig,
    shutdown: CancellationToken,
}

impl WorkerPool {
    pub fn new(config: PoolConfig) -> Self {
        let workers = config.workers.max(1);
        let slots = workers + config.queue_limit;
        Self {
            admission: Arc::new(Semaphore::new(slots)),
            workers: Arc::new(Semaphore::new(workers)),
            config: PoolConfig { workers, ..config },
            shutdown: CancellationToken::new(),
        }
    }

    #[cfg(test)]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Admission slots currently free (running + queued capacity)
    pub fn available_slots(&self) -> usize {
        self.admission.available_permits()
    }

    /// Run `job` on a blocking worker within the pool deadline.
    ///
    /// On timeout the job's token is cancelled and the caller gets
    /// `TimedOut` right away; the slot is released once the job returns.
    pub async fn dispatch<T, F>(&self, job: F) -> Result<T, DispatchError>
    where
        F: FnOnce(CancellationToken) -> T + Send + 'static,
        T: Send + 'static,
    {
        let admission = self
            .admission
            .clone()
            .try_acquire_owned()
            .map_err(|_| DispatchError::Saturated)?;

        let cancel = self.shutdown.child_token();
        let job_cancel = cancel.clone();
        let workers = self.workers.clone();

        let run = async move {
            let worker = workers
                .acquire_owned()
                .await
                .map_err(|_| DispatchError::Saturated)?;

            let handle = tokio::task::spawn_blocking(move || {
                // Both permits live until the job returns, even if the caller
                // stopped waiting
                let _admission = admission;
                let _worker = worker;
                job(job_cancel)
            });

            handle.await.map_err(|e| DispatchError::Failed(e.to_string()))
        };

        match tokio::time::timeout(self.config.timeout, run).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Job exceeded {:?} deadline, cancelling", self.config.timeout);
                cancel.cancel();
                Err(DispatchError::TimedOut(self.config.timeout))
            }
        }
    }

    /// Cancel every in-flight job and refuse new ones
    pub fn shutdown(&self) {
        debug!("Shutting down worker pool");
        self.shutdown.cancel();
        self.admission.close();
        self.workers.close();
    }
}
