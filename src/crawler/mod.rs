//! Crawler module: the single-page crawl-and-analyze engine
//!
//! A crawl runs strictly in this order:
//! - fetch the target page
//! - parse it into a document tree
//! - detect the version, extract metadata, and enumerate links
//! - probe every link with bounded concurrency
//! - aggregate everything into a [`CrawlResult`]

mod fetcher;
mod links;
mod metadata;
mod parser;
mod prober;
mod result;
mod version;

pub use fetcher::{build_http_client, fetch_document, FetchedDocument};
pub use links::{
    enumerate_links, is_internal_link, resolve_probe_url, should_skip, LinkCandidate, LinkCounts,
};
pub use metadata::{extract_metadata, PageMetadata};
pub use parser::{parse_document, DocumentTree};
pub use prober::{broken_entries, probe_link, probe_links, ProbeOutcome};
pub use result::{aggregate, BrokenLinkEntry, CrawlResult};
pub use version::{detect_html_version, UNKNOWN_VERSION};

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::url::parse_target;
use crate::{CrawlError, CrawlOutcome};
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Everything read from the document before probing starts
struct PageAnalysis {
    version: String,
    metadata: PageMetadata,
    links: Vec<LinkCandidate>,
}

/// The crawl engine
///
/// Holds the shared HTTP client and probe settings; no other state survives
/// between crawls, so one `Crawler` can serve many concurrent crawls.
#[derive(Debug, Clone)]
pub struct Crawler {
    client: Client,
    max_concurrent_probes: usize,
    probe_timeout: Duration,
}

impl Crawler {
    pub fn new(
        config: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config, user_agent)?,
            max_concurrent_probes: config.max_concurrent_probes,
            probe_timeout: config.probe_timeout(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(&config.crawler, &config.user_agent)
    }

    /// Crawls one target page to completion
    pub async fn crawl(&self, target: &str) -> CrawlOutcome {
        self.crawl_with_cancellation(target, &CancellationToken::new())
            .await
    }

    /// Crawls one target page, abandoning it if `cancel` fires
    ///
    /// Cancellation drops the in-flight fetch or probes and resolves to
    /// `CrawlError::Cancelled`; no partial result is ever returned.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - The page was fetched, parsed, and every link probed
    /// * `Err(CrawlError)` - The crawl failed or was cancelled
    pub async fn crawl_with_cancellation(
        &self,
        target: &str,
        cancel: &CancellationToken,
    ) -> CrawlOutcome {
        let url = parse_target(target)?;
        let base_url = target.trim();

        tracing::info!("Crawling {}", url);

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(&url)),
            fetched = fetch_document(&self.client, &url) => fetched?,
        };

        if fetched.final_url != url.as_str() {
            tracing::info!("{} redirected to {}", url, fetched.final_url);
        }

        let analysis = analyze_document(&url, base_url, &fetched)?;
        tracing::debug!(
            "Parsed {}: version {}, {} distinct links",
            url,
            analysis.version,
            analysis.links.len()
        );

        let outcomes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(&url)),
            outcomes = probe_links(
                &self.client,
                &analysis.links,
                self.max_concurrent_probes,
                self.probe_timeout,
            ) => outcomes,
        };

        let counts = LinkCounts::from_candidates(&analysis.links);
        let broken = broken_entries(&analysis.links, &outcomes);
        let result = aggregate(analysis.version, analysis.metadata, counts, broken);

        tracing::info!(
            "Crawled {}: {} internal, {} external, {} broken",
            url,
            result.internal_links,
            result.external_links,
            result.broken_links
        );

        Ok(result)
    }
}

/// Crawls one target page with default settings
pub async fn crawl(target: &str) -> CrawlOutcome {
    let crawler = Crawler::new(&CrawlerConfig::default(), &UserAgentConfig::default())
        .map_err(|source| CrawlError::Network {
            url: target.trim().to_string(),
            source,
        })?;
    crawler.crawl(target).await
}

/// Parses the body and runs every extractor over the tree
///
/// Parse errors name the URL that served the body. Links are resolved and
/// classified against the submitted target, not the post-redirect URL.
/// The tree is not `Send`, so it lives and dies inside this synchronous call.
fn analyze_document(
    url: &Url,
    base_url: &str,
    fetched: &FetchedDocument,
) -> Result<PageAnalysis, CrawlError> {
    let document = parse_document(&fetched.final_url, &fetched.body)?;

    Ok(PageAnalysis {
        version: detect_html_version(&document),
        metadata: extract_metadata(&document),
        links: enumerate_links(&document, url, base_url),
    })
}

fn cancelled(url: &Url) -> CrawlError {
    tracing::info!("Crawl of {} cancelled", url);
    CrawlError::Cancelled { url: url.to_string() }
}
