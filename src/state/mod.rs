//! State module for tracking crawl job progress
//!
//! - `JobStatus`: the lifecycle of one crawl job (queued, running, done, error)

mod job_status;

pub use job_status::JobStatus;
