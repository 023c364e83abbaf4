//! Crawl job orchestration
//!
//! Submitted addresses become job records in the store and background crawl
//! tasks; callers observe completion through a [`JobHandle`] or the record's
//! status field.

mod runner;

pub use runner::{JobHandle, JobOutcome, JobRunner, Submission, DEFAULT_LEASE};
