//! Batch validation of extracted links, with refresh of expired ones.
//!
//! Keeps up to `workers` probes in flight; each probe runs on a blocking
//! thread with its own timeout, so a slow or failing probe never holds up
//! its siblings. Output order follows input order, and a refreshed record
//! is placed directly after the record it supersedes.

mod refresh;
mod summary;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{ProbeConfig, RefreshConfig};
use crate::extract::{LinkRecord, LinkStatus};
use crate::probe::probe_link;

pub use refresh::{minting_url, refresh};
pub use summary::VerifySummary;

/// Probe every link, refreshing expired ones when `refresh_cfg` is set.
///
/// Once `cancel` is set no further probes are issued; links not yet probed
/// come back unchanged.
pub async fn verify_links(
    links: Vec<LinkRecord>,
    probe_cfg: &ProbeConfig,
    refresh_cfg: Option<&RefreshConfig>,
    domain: &str,
    cancel: Arc<AtomicBool>,
) -> Vec<LinkRecord> {
    let max_concurrent = probe_cfg.workers.max(1);
    let mut slots: Vec<(LinkRecord, Option<LinkRecord>)> =
        links.into_iter().map(|l| (l, None)).collect();

    let mut next = 0usize;
    let mut join_set = tokio::task::JoinSet::new();

    loop {
        while join_set.len() < max_concurrent && next < slots.len() {
            if cancel.load(Ordering::Relaxed) {
                tracing::info!(remaining = slots.len() - next, "verification cancelled");
                next = slots.len();
                break;
            }
            let index = next;
            next += 1;
            let link = slots[index].0.clone();
            let probe_cfg = probe_cfg.clone();
            let refresh_cfg = refresh_cfg.cloned();
            let domain = domain.to_string();
            join_set.spawn(async move {
                let res = tokio::task::spawn_blocking(move || {
                    check_one(link, &probe_cfg, refresh_cfg.as_ref(), &domain)
                })
                .await;
                (index, res)
            });
        }

        let Some(joined) = join_set.join_next().await else {
            break;
        };
        match joined {
            Ok((index, Ok((checked, replacement)))) => slots[index] = (checked, replacement),
            Ok((index, Err(e))) => {
                tracing::warn!(url = %slots[index].0.download_url, error = %e, "probe task failed");
            }
            Err(e) => tracing::warn!(error = %e, "probe task join failed"),
        }
    }

    let mut out = Vec::with_capacity(slots.len());
    for (link, replacement) in slots {
        out.push(link);
        out.extend(replacement);
    }
    out
}

/// Probe one link; on expiry, mint a replacement and probe it once. A link
/// already superseded by an earlier run is only re-probed.
fn check_one(
    mut link: LinkRecord,
    probe_cfg: &ProbeConfig,
    refresh_cfg: Option<&RefreshConfig>,
    domain: &str,
) -> (LinkRecord, Option<LinkRecord>) {
    probe_link(&mut link, probe_cfg);
    if link.status != LinkStatus::Expired || link.superseded_by.is_some() {
        return (link, None);
    }
    let Some(refresh_cfg) = refresh_cfg else {
        return (link, None);
    };
    let Some(mut fresh) = refresh(&link, refresh_cfg, domain) else {
        tracing::warn!(url = %link.source_request_url, "link expired and could not be re-minted; recapture needed");
        return (link, None);
    };
    probe_link(&mut fresh, probe_cfg);
    link.superseded_by = Some(fresh.download_url.clone());
    (link, Some(fresh))
}
