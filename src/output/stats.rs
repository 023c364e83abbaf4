//! Statistics generation from the job store
//!
//! This module provides functionality for extracting and displaying
//! job statistics from the storage layer.

use crate::state::JobStatus;
use crate::storage::{JobStore, StorageResult};
use std::collections::HashMap;

/// Job store statistics summary
#[derive(Debug, Clone)]
pub struct JobStatistics {
    /// Total number of jobs
    pub total_jobs: u64,

    /// Count of jobs by status; statuses with no jobs are omitted
    pub jobs_by_status: HashMap<JobStatus, u64>,

    /// Broken links stored across all finished jobs
    pub broken_links: u64,
}

impl JobStatistics {
    pub fn count(&self, status: JobStatus) -> u64 {
        self.jobs_by_status.get(&status).copied().unwrap_or(0)
    }

    /// Share of finished jobs that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        let done = self.count(JobStatus::Done);
        let finished = done + self.count(JobStatus::Error);
        if finished == 0 {
            0.0
        } else {
            (done as f64 / finished as f64) * 100.0
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The job store to query
pub fn load_statistics<S: JobStore + ?Sized>(store: &S) -> StorageResult<JobStatistics> {
    let total_jobs = store.count_total_jobs()?;

    let mut jobs_by_status = HashMap::new();
    for status in JobStatus::ALL {
        let count = store.count_jobs_by_status(status)?;
        if count > 0 {
            jobs_by_status.insert(status, count);
        }
    }

    let broken_links = store.count_broken_links()?;

    Ok(JobStatistics {
        total_jobs,
        jobs_by_status,
        broken_links,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &JobStatistics) {
    println!("=== Job Statistics ===\n");

    println!("Overview:");
    println!("  Total jobs: {}", stats.total_jobs);
    println!("  Broken links recorded: {}", stats.broken_links);
    println!();

    println!("Jobs by Status:");
    for status in JobStatus::ALL {
        let count = stats.count(status);
        let percentage = if stats.total_jobs > 0 {
            (count as f64 / stats.total_jobs as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} done / {} finished)",
        stats.success_rate(),
        stats.count(JobStatus::Done),
        stats.count(JobStatus::Done) + stats.count(JobStatus::Error)
    );
}
