//! Configuration module for Page-Inspector
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use page_inspector::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("inspector.toml")).unwrap();
//! println!("Probe concurrency: {}", config.crawler.max_concurrent_probes);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
