//! Job runner: turns submitted addresses into background crawl tasks
//!
//! Each job runs as its own tokio task. A semaphore bounds how many crawls run
//! at once, and every task gets a child of the runner's shutdown token so a
//! single `shutdown()` cancels all of them.
//!
//! A running job holds a lease in the store and renews it while the crawl is
//! in flight, so another process recovering abandoned jobs can tell a live
//! crawl from one whose process died.

use crate::crawler::Crawler;
use crate::state::JobStatus;
use crate::storage::{JobRecord, JobStore, StorageError, StorageResult};
use crate::url::parse_target;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default lease a running job holds before it counts as abandoned
pub const DEFAULT_LEASE: Duration = Duration::from_secs(60);

/// How a crawl task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The result was stored and the job is `done`
    Done { broken_links: u32 },

    /// The job is `error`, or could not be updated at all
    Failed { message: String },

    /// The crawl was abandoned and the job is back to `queued`
    Cancelled,
}

/// Handle to a spawned crawl task
#[derive(Debug)]
pub struct JobHandle {
    job_id: i64,
    cancel: CancellationToken,
    task: JoinHandle<JobOutcome>,
}

impl JobHandle {
    pub fn job_id(&self) -> i64 {
        self.job_id
    }

    /// Asks the task to stop; in-flight probes are dropped
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the task to finish
    pub async fn wait(self) -> JobOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => JobOutcome::Failed {
                message: format!("crawl task for job {} did not finish: {}", self.job_id, e),
            },
        }
    }
}

/// Result of submitting an address
#[derive(Debug)]
pub enum Submission {
    /// A new job was created and its crawl spawned
    Created(JobHandle),

    /// A job for this address already exists; nothing was started
    Existing(JobRecord),
}

/// Spawns and tracks crawl jobs against an injected job store
pub struct JobRunner<S> {
    store: Arc<Mutex<S>>,
    crawler: Arc<Crawler>,
    permits: Arc<Semaphore>,
    shutdown: CancellationToken,
    lease: Duration,
}

impl<S> JobRunner<S>
where
    S: JobStore + Send + 'static,
{
    /// Creates a runner allowing `max_concurrent` crawls at once
    pub fn new(store: S, crawler: Crawler, max_concurrent: usize) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            crawler: Arc::new(crawler),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            shutdown: CancellationToken::new(),
            lease: DEFAULT_LEASE,
        }
    }

    /// Sets how long a running job's lease lasts; it is renewed every third of that
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease.max(Duration::from_millis(30));
        self
    }

    /// Shared handle to the job store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// Runs a synchronous operation against the store
    pub fn with_store<T>(&self, op: impl FnOnce(&mut S) -> StorageResult<T>) -> StorageResult<T> {
        with_store(&*self.store, op)
    }

    /// Submits an address for crawling
    ///
    /// An address that already has a job returns that job unchanged.
    pub fn submit(&self, address: &str) -> crate::Result<Submission> {
        let address = address.trim();
        parse_target(address)?;

        let job = self.with_store(|store| match store.get_job_by_address(address)? {
            Some(existing) => Ok(Err(existing)),
            None => store.create_job(address).map(Ok),
        })?;

        match job {
            Ok(job) => {
                tracing::info!("Queued job {} for {}", job.id, address);
                Ok(Submission::Created(self.spawn(job.id, job.address)))
            }
            Err(existing) => {
                tracing::info!("Job {} already exists for {}", existing.id, address);
                Ok(Submission::Existing(existing))
            }
        }
    }

    /// Clears a finished job's results and crawls it again
    pub fn rerun(&self, job_id: i64) -> crate::Result<JobHandle> {
        let job = self.with_store(|store| store.reset_job(job_id))?;
        tracing::info!("Requeued job {} for {}", job.id, job.address);

        Ok(self.spawn(job.id, job.address))
    }

    /// Cancels every outstanding job
    pub fn shutdown(&self) {
        tracing::info!("Cancelling outstanding jobs");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn spawn(&self, job_id: i64, address: String) -> JobHandle {
        let cancel = self.shutdown.child_token();
        let task = tokio::spawn(run_job(
            Arc::clone(&self.store),
            Arc::clone(&self.crawler),
            Arc::clone(&self.permits),
            job_id,
            address,
            self.lease,
            cancel.clone(),
        ));

        JobHandle {
            job_id,
            cancel,
            task,
        }
    }
}

fn with_store<S, T>(
    store: &Mutex<S>,
    op: impl FnOnce(&mut S) -> StorageResult<T>,
) -> StorageResult<T> {
    let mut guard = store
        .lock()
        .map_err(|_| StorageError::Database("job store lock poisoned".to_string()))?;
    op(&mut guard)
}

fn lease_until(lease: Duration) -> chrono::DateTime<Utc> {
    let lease = chrono::Duration::from_std(lease).unwrap_or_else(|_| chrono::Duration::seconds(60));
    Utc::now() + lease
}

/// Body of one crawl task
async fn run_job<S>(
    store: Arc<Mutex<S>>,
    crawler: Arc<Crawler>,
    permits: Arc<Semaphore>,
    job_id: i64,
    address: String,
    lease: Duration,
    cancel: CancellationToken,
) -> JobOutcome
where
    S: JobStore + Send,
{
    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!("Job {} cancelled before starting", job_id);
            return JobOutcome::Cancelled;
        }
        permit = permits.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return JobOutcome::Cancelled,
        },
    };

    if let Err(e) = with_store(&*store, |s| s.claim_job(job_id, lease_until(lease))) {
        tracing::error!("Failed to start job {}: {}", job_id, e);
        return JobOutcome::Failed {
            message: e.to_string(),
        };
    }

    let crawl = crawler.crawl_with_cancellation(&address, &cancel);
    tokio::pin!(crawl);

    let mut heartbeat = tokio::time::interval(lease / 3);
    heartbeat.tick().await;

    let outcome = loop {
        tokio::select! {
            outcome = &mut crawl => break outcome,
            _ = heartbeat.tick() => {
                match with_store(&*store, |s| s.renew_lease(job_id, lease_until(lease))) {
                    Ok(true) => {}
                    Ok(false) => tracing::warn!("Job {} is no longer running here", job_id),
                    Err(e) => tracing::warn!("Failed to renew lease of job {}: {}", job_id, e),
                }
            }
        }
    };

    match outcome {
        Ok(result) => match with_store(&*store, |s| s.record_result(job_id, &result)) {
            Ok(()) => {
                tracing::info!("Job {} done ({} broken links)", job_id, result.broken_links);
                JobOutcome::Done {
                    broken_links: result.broken_links,
                }
            }
            Err(e) => {
                tracing::error!("Failed to store result of job {}: {}", job_id, e);
                JobOutcome::Failed {
                    message: e.to_string(),
                }
            }
        },
        Err(e) if e.is_cancelled() => {
            if let Err(e) = with_store(&*store, |s| s.update_status(job_id, JobStatus::Queued)) {
                tracing::error!("Failed to requeue cancelled job {}: {}", job_id, e);
            }
            JobOutcome::Cancelled
        }
        Err(e) => {
            let message = e.to_string();
            tracing::error!("Job {} failed: {}", job_id, message);
            if let Err(e) = with_store(&*store, |s| s.record_failure(job_id, &message)) {
                tracing::error!("Failed to mark job {} as failed: {}", job_id, e);
            }
            JobOutcome::Failed { message }
        }
    }
}
