//! Page-Inspector: a single-page structure and link-health analyzer
//!
//! This crate fetches one target page, extracts its document metadata
//! (doctype version, title, heading counts, login-form presence), classifies
//! its outbound links as internal or external, and probes every link for
//! reachability. Crawls are tracked as jobs in a SQLite-backed job store.

pub mod config;
pub mod crawler;
pub mod jobs;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Page-Inspector operations
#[derive(Debug, Error)]
pub enum InspectorError {
    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Errors that abort a crawl
///
/// Failures while probing individual links are never reported here; they
/// become [`crawler::BrokenLinkEntry`] values in the result instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Invalid target URL: {0}")]
    InvalidTarget(#[from] UrlError),

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("URL {url} returned HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTML parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Crawl of {url} was cancelled")]
    Cancelled { url: String },
}

impl CrawlError {
    /// Returns true if the crawl was abandoned rather than failed
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL '{url}': {message}")]
    Parse { url: String, message: String },

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for Page-Inspector operations
pub type Result<T> = std::result::Result<T, InspectorError>;

/// Result type alias for a single crawl
pub type CrawlOutcome = std::result::Result<crawler::CrawlResult, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, BrokenLinkEntry, CrawlResult, Crawler};
pub use jobs::{JobHandle, JobOutcome, JobRunner, Submission};
pub use state::JobStatus;
pub use storage::{JobRecord, JobStore, SqliteStore};
