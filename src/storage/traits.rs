//! Storage traits and error types
//!
//! This module defines the trait interface for job store backends and
//! associated error types.

use crate::crawler::CrawlResult;
use crate::state::JobStatus;
use crate::storage::{JobPage, JobRecord, ListQuery};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Job not found: {0}")]
    JobNotFound(i64),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for job store implementations
///
/// The job runner receives a store through this trait and never touches the
/// database directly. Writes take `&mut self`; callers sharing a store across
/// tasks wrap it in a mutex.
pub trait JobStore {
    // ===== Job Lifecycle =====

    /// Creates a `queued` record for an address
    ///
    /// Addresses are unique; creating a second record for the same address
    /// fails with `ConstraintViolation`.
    fn create_job(&mut self, address: &str) -> StorageResult<JobRecord>;

    /// Gets a job by ID, including its broken-link details
    fn get_job(&self, job_id: i64) -> StorageResult<JobRecord>;

    /// Gets a job by its exact address
    fn get_job_by_address(&self, address: &str) -> StorageResult<Option<JobRecord>>;

    /// Lists one page of jobs
    ///
    /// Listed records carry no broken-link details; use `get_job` for those.
    fn list_jobs(&self, query: &ListQuery) -> StorageResult<JobPage>;

    /// Moves a job to `status`, rejecting transitions the lifecycle forbids
    fn update_status(&mut self, job_id: i64, status: JobStatus) -> StorageResult<()>;

    /// Moves a `queued` job to `running` under a lease ending at `lease_until`
    ///
    /// A running job whose lease has lapsed counts as abandoned and may be
    /// requeued by [`JobStore::requeue_interrupted`].
    fn claim_job(&mut self, job_id: i64, lease_until: DateTime<Utc>) -> StorageResult<()>;

    /// Extends the lease of a running job
    ///
    /// Returns false if the job is no longer `running`.
    fn renew_lease(&mut self, job_id: i64, lease_until: DateTime<Utc>) -> StorageResult<bool>;

    /// Stores a crawl result and marks the job `done`
    ///
    /// Replaces any previous broken links and clears the error message, all
    /// in one transaction. The job must be `running`.
    fn record_result(&mut self, job_id: i64, result: &CrawlResult) -> StorageResult<()>;

    /// Marks a running job `error` with a message
    fn record_failure(&mut self, job_id: i64, message: &str) -> StorageResult<()>;

    /// Clears a job's results and puts it back to `queued`
    ///
    /// Rejected while the job is `running`.
    fn reset_job(&mut self, job_id: i64) -> StorageResult<JobRecord>;

    /// Moves `running` jobs whose lease is missing or expired at `now` back to `queued`
    ///
    /// Used at startup to recover jobs left behind by an interrupted process.
    /// Jobs still leased by a live process are left alone. Returns the number
    /// of jobs requeued.
    fn requeue_interrupted(&mut self, now: DateTime<Utc>) -> StorageResult<u64>;

    /// Deletes a job and its broken links
    fn delete_job(&mut self, job_id: i64) -> StorageResult<()>;

    // ===== Statistics =====

    /// Gets total job count
    fn count_total_jobs(&self) -> StorageResult<u64>;

    /// Counts jobs in a status
    fn count_jobs_by_status(&self, status: JobStatus) -> StorageResult<u64>;

    /// Counts stored broken links across all jobs
    fn count_broken_links(&self) -> StorageResult<u64>;
}
