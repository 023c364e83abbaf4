//! Link enumeration and internal/external classification
//!
//! # Rules
//!
//! **Skipped** (neither counted nor probed):
//! - empty or whitespace-only hrefs
//! - fragment-only hrefs (`#section`)
//! - `mailto:` addresses
//! - repeats of an href already seen on the page
//!
//! **Internal**: hrefs starting with `/`, and hrefs without an absolute
//! `http://`/`https://` scheme marker.
//!
//! **External**: absolute hrefs that do not contain the base URL as a substring.
//! The substring test is deliberately textual: a foreign host that happens to
//! contain the target's URL (`https://example.com.evil.net` for base
//! `https://example.com`) counts as internal.

use crate::crawler::parser::DocumentTree;
use crate::url::{has_absolute_scheme, is_mailto, resolve_site_relative};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// A link found on the page, ready to be probed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCandidate {
    /// The trimmed href as written in the page
    pub href: String,

    /// The URL the probe will request
    pub resolved_url: String,

    /// Whether the link stays on the target's site
    pub is_internal: bool,
}

/// Internal/external tallies for a set of candidates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCounts {
    pub internal: u32,
    pub external: u32,
}

impl LinkCounts {
    pub fn from_candidates(candidates: &[LinkCandidate]) -> Self {
        candidates
            .iter()
            .fold(Self::default(), |mut counts, candidate| {
                if candidate.is_internal {
                    counts.internal += 1;
                } else {
                    counts.external += 1;
                }
                counts
            })
    }

    pub fn total(&self) -> u32 {
        self.internal + self.external
    }
}

/// Enumerates the distinct, non-skipped anchor hrefs of a page
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `base` - The parsed target URL, used to resolve site-relative hrefs
/// * `base_url` - The target URL as submitted, used for classification
pub fn enumerate_links(document: &DocumentTree, base: &Url, base_url: &str) -> Vec<LinkCandidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for raw_href in document.attribute_values("a", "href") {
        let href = raw_href.trim();
        if should_skip(href) {
            continue;
        }

        if !seen.insert(href.to_string()) {
            tracing::trace!("Skipping repeated href {}", href);
            continue;
        }

        candidates.push(LinkCandidate {
            href: href.to_string(),
            resolved_url: resolve_probe_url(href, base),
            is_internal: is_internal_link(href, base_url),
        });
    }

    candidates
}

/// Returns true for hrefs that are neither counted nor probed
pub fn should_skip(href: &str) -> bool {
    let href = href.trim();
    href.is_empty() || href.starts_with('#') || is_mailto(href)
}

/// Classifies a trimmed href relative to the base URL string
pub fn is_internal_link(href: &str, base_url: &str) -> bool {
    if href.starts_with('/') || !has_absolute_scheme(href) {
        return true;
    }
    href.contains(base_url)
}

/// The URL a probe should request for a trimmed href
///
/// Site-relative hrefs are joined onto the base URL's origin; every other
/// href is requested as written.
pub fn resolve_probe_url(href: &str, base: &Url) -> String {
    if href.starts_with('/') {
        resolve_site_relative(base, href)
    } else {
        href.to_string()
    }
}
