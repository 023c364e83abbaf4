/// Job status definitions for tracking crawl progress
///
/// A job moves `queued -> running -> done | error`. Cancelling a running job
/// returns it to `queued`, and a finished job can be queued again for a rerun.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job has been accepted but no crawl has started yet
    Queued,

    /// The crawl engine is working on this job
    Running,

    /// The crawl finished and its result has been stored
    Done,

    /// The crawl failed fatally; no result was stored
    Error,
}

impl JobStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [JobStatus; 4] = [Self::Queued, Self::Running, Self::Done, Self::Error];

    /// Checks whether a job in this status may move to `next`
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running)
                | (Self::Running, Self::Done)
                | (Self::Running, Self::Error)
                | (Self::Running, Self::Queued)
                | (Self::Done, Self::Queued)
                | (Self::Error, Self::Queued)
        )
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_string(&s.trim().to_ascii_lowercase()).ok_or_else(|| {
            format!(
                "unknown job status '{}', expected one of: queued, running, done, error",
                s
            )
        })
    }
}
