//! Output module for presenting jobs and crawl results
//!
//! This module handles:
//! - One-line summaries of finished jobs
//! - Tabular job listings
//! - Markdown reports for a single job
//! - Job store statistics

mod markdown;
pub mod stats;

pub use markdown::{format_job_report, write_job_report};
pub use stats::{load_statistics, print_statistics, JobStatistics};

use crate::jobs::JobOutcome;
use crate::storage::{JobPage, JobRecord};

/// Longest address shown in a listing row before it is shortened
const ADDRESS_WIDTH: usize = 48;

/// One line describing how a job ended
pub fn format_outcome(job_id: i64, address: &str, outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Done { broken_links } => {
            format!("[{}] {}: done, {} broken links", job_id, address, broken_links)
        }
        JobOutcome::Failed { message } => format!("[{}] {}: error: {}", job_id, address, message),
        JobOutcome::Cancelled => format!("[{}] {}: cancelled, left queued", job_id, address),
    }
}

/// One line describing a job that already existed when it was submitted
pub fn format_existing(job: &JobRecord) -> String {
    format!(
        "[{}] {}: already submitted ({})",
        job.id, job.address, job.status
    )
}

/// Formats one page of a job listing as a fixed-width table
pub fn format_job_table(page: &JobPage) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:>5}  {:<8}  {:<width$}  {:<24}  {:>5}  {:>5}  {:>6}\n",
        "ID",
        "STATUS",
        "ADDRESS",
        "VERSION",
        "INT",
        "EXT",
        "BROKEN",
        width = ADDRESS_WIDTH
    ));

    for job in &page.data {
        out.push_str(&format!(
            "{:>5}  {:<8}  {:<width$}  {:<24}  {:>5}  {:>5}  {:>6}\n",
            job.id,
            job.status.to_string(),
            shorten(&job.address, ADDRESS_WIDTH),
            shorten(job.html_version.as_deref().unwrap_or("-"), 24),
            job.internal_links,
            job.external_links,
            job.broken_links,
            width = ADDRESS_WIDTH
        ));
    }

    out.push_str(&format!(
        "\nPage {} of {} ({} jobs total, {} per page)\n",
        page.page,
        page.total_pages.max(1),
        page.total,
        page.limit
    ));

    out
}

fn shorten(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut short: String = value.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}
