//! Crawl result aggregation

use crate::crawler::links::LinkCounts;
use crate::crawler::metadata::PageMetadata;
use serde::{Deserialize, Serialize};

/// A link whose probe failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLinkEntry {
    pub url: String,

    /// Received status, or 0 when the probe got no response
    pub status_code: u16,
}

/// Everything a successful crawl reports about one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub html_version: String,
    pub title: String,
    pub h1_count: u32,
    pub h2_count: u32,
    pub h3_count: u32,
    pub h4_count: u32,
    pub h5_count: u32,
    pub h6_count: u32,
    pub internal_links: u32,
    pub external_links: u32,
    pub broken_links: u32,
    pub broken_link_details: Vec<BrokenLinkEntry>,
    pub has_login_form: bool,
}

impl CrawlResult {
    /// Heading counts for levels 1 through 6
    pub fn heading_counts(&self) -> [u32; 6] {
        [
            self.h1_count,
            self.h2_count,
            self.h3_count,
            self.h4_count,
            self.h5_count,
            self.h6_count,
        ]
    }

    pub fn total_links(&self) -> u32 {
        self.internal_links + self.external_links
    }
}

/// Assembles the final result; `broken_links` always equals the detail count
pub fn aggregate(
    html_version: String,
    metadata: PageMetadata,
    counts: LinkCounts,
    broken_link_details: Vec<BrokenLinkEntry>,
) -> CrawlResult {
    let [h1_count, h2_count, h3_count, h4_count, h5_count, h6_count] = metadata.heading_counts;

    CrawlResult {
        html_version,
        title: metadata.title,
        h1_count,
        h2_count,
        h3_count,
        h4_count,
        h5_count,
        h6_count,
        internal_links: counts.internal,
        external_links: counts.external,
        broken_links: broken_link_details.len() as u32,
        broken_link_details,
        has_login_form: metadata.has_login_form,
    }
}
