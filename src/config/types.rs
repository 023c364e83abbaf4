use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Page-Inspector
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawl engine behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Total timeout for fetching the target page (seconds)
    #[serde(rename = "fetch-timeout")]
    pub fetch_timeout: u64,

    /// Timeout for establishing any connection (seconds)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,

    /// Timeout for a single link probe (seconds)
    #[serde(rename = "probe-timeout")]
    pub probe_timeout: u64,

    /// Maximum number of redirects followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Maximum number of link probes in flight for one crawl
    #[serde(rename = "max-concurrent-probes")]
    pub max_concurrent_probes: usize,

    /// Maximum number of crawl jobs running at once
    #[serde(rename = "max-concurrent-crawls")]
    pub max_concurrent_crawls: usize,
}

impl CrawlerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: 30,
            connect_timeout: 10,
            probe_timeout: 10,
            max_redirects: 10,
            max_concurrent_probes: 16,
            max_concurrent_crawls: 4,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "PageInspector".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/page-inspector".to_string(),
            contact_email: "page-inspector@example.com".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite job database
    #[serde(rename = "database-path")]
    pub database_path: String,
}
