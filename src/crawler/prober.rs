//! Link health probing
//!
//! Every candidate gets one HEAD request. Probes run as a bounded fan-out
//! over the candidate list; each probe's outcome lands in a slot addressed by
//! the candidate's index, so the merged outcomes keep document order.

use crate::crawler::fetcher::describe_transport_error;
use crate::crawler::links::LinkCandidate;
use crate::crawler::result::BrokenLinkEntry;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Duration;

/// Result of probing a single link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub ok: bool,

    /// Status received, or 0 if no response was obtained
    pub status_code: u16,
}

impl ProbeOutcome {
    /// Outcome for a probe that never got a response
    pub const fn unreachable() -> Self {
        Self {
            ok: false,
            status_code: 0,
        }
    }

    /// Outcome for a received status
    pub fn from_status(status_code: u16) -> Self {
        Self {
            ok: status_code < 400,
            status_code,
        }
    }
}

/// Probes one URL with a HEAD request bounded by `timeout`
///
/// Transport failures, including timeouts and URLs that cannot be requested
/// at all, yield [`ProbeOutcome::unreachable`].
pub async fn probe_link(client: &Client, url: &str, timeout: Duration) -> ProbeOutcome {
    match client.head(url).timeout(timeout).send().await {
        Ok(response) => {
            let outcome = ProbeOutcome::from_status(response.status().as_u16());
            if !outcome.ok {
                tracing::debug!("Broken link {} (status {})", url, outcome.status_code);
            }
            outcome
        }
        Err(e) => {
            tracing::debug!("Broken link {} ({})", url, describe_transport_error(&e));
            ProbeOutcome::unreachable()
        }
    }
}

/// Probes every candidate with at most `max_concurrent` requests in flight
///
/// The returned outcomes are index-aligned with `links`.
pub async fn probe_links(
    client: &Client,
    links: &[LinkCandidate],
    max_concurrent: usize,
    timeout: Duration,
) -> Vec<ProbeOutcome> {
    let mut slots: Vec<Option<ProbeOutcome>> = vec![None; links.len()];
    let targets: Vec<(usize, String)> = links
        .iter()
        .enumerate()
        .map(|(index, link)| (index, link.resolved_url.clone()))
        .collect();

    let mut probes = stream::iter(targets)
        .map(|(index, url)| {
            let client = client.clone();
            async move { (index, probe_link(&client, &url, timeout).await) }
        })
        .buffer_unordered(max_concurrent.max(1));

    while let Some((index, outcome)) = probes.next().await {
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(outcome);
        }
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(ProbeOutcome::unreachable))
        .collect()
}

/// Pairs candidates with their outcomes and keeps the broken ones, in order
pub fn broken_entries(
    links: &[LinkCandidate],
    outcomes: &[ProbeOutcome],
) -> Vec<BrokenLinkEntry> {
    links
        .iter()
        .zip(outcomes)
        .filter(|(_, outcome)| !outcome.ok)
        .map(|(link, outcome)| BrokenLinkEntry {
            url: link.resolved_url.clone(),
            status_code: outcome.status_code,
        })
        .collect()
}
