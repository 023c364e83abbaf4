//! HTTP fetcher implementation
//!
//! This module handles the single GET request that retrieves the target page:
//! - Building the shared HTTP client with a proper user agent string
//! - Bounded total and connect timeouts
//! - Error classification into fatal crawl errors

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::CrawlError;
use reqwest::{redirect::Policy, Client};
use url::Url;

/// The raw target document, as retrieved
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Final URL after redirects
    pub final_url: String,

    /// Undecoded response body
    pub body: Vec<u8>,
}

/// Builds an HTTP client with proper configuration
///
/// The same client is used for the target fetch and for every link probe;
/// probes override the total timeout per request.
///
/// # Example
///
/// ```no_run
/// use page_inspector::config::{CrawlerConfig, UserAgentConfig};
/// use page_inspector::crawler::build_http_client;
///
/// let client =
///     build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    config: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    let redirect = if config.max_redirects == 0 {
        Policy::none()
    } else {
        Policy::limited(config.max_redirects)
    };

    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(config.fetch_timeout())
        .connect_timeout(config.connect_timeout())
        .redirect(redirect)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches the target page
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx/3xx final status | `Ok(FetchedDocument)` |
/// | Status >= 400 | `CrawlError::HttpStatus` |
/// | DNS failure, refused connection, timeout | `CrawlError::Network` |
/// | Body read failure | `CrawlError::Network` |
pub async fn fetch_document(
    client: &Client,
    url: &Url,
) -> Result<FetchedDocument, CrawlError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| {
            tracing::warn!("Failed to GET {}: {}", url, describe_transport_error(&source));
            CrawlError::Network {
                url: url.to_string(),
                source,
            }
        })?;

    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(CrawlError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().to_string();

    let body = response
        .bytes()
        .await
        .map_err(|source| CrawlError::Network {
            url: url.to_string(),
            source,
        })?;

    tracing::debug!(
        "Fetched {} ({} bytes, status {}, final URL {})",
        url,
        body.len(),
        status.as_u16(),
        final_url
    );

    Ok(FetchedDocument {
        final_url,
        body: body.to_vec(),
    })
}

/// Short, log-friendly description of a transport failure
pub(crate) fn describe_transport_error(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "request timed out"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_redirect() {
        "too many redirects"
    } else if error.is_builder() {
        "invalid request URL"
    } else if error.is_body() || error.is_decode() {
        "failed to read response body"
    } else {
        "request failed"
    }
}
