//! Link extraction: mine captured exchanges for signed download URLs.
//!
//! Each response body goes through the tiers in [`detect`]; a candidate is
//! admitted only when the decomposer recognizes its host as part of the
//! storage domain. Output order follows input order and the first record
//! carrying a given URL wins.

mod detect;
mod report;

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::exchange::{deserialize_query_params, deserialize_timestamp, ExchangeRecord, QueryParams};
use crate::signed_url::{decompose_for_domain, DecomposedUrl};
use crate::store::{list_session_logs, load_log_file};

pub use detect::{Candidate, Detector, Tier};
pub use report::LinkReport;

/// Liveness of a link's URL as of its last probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    #[default]
    Unchecked,
    Valid,
    Expired,
    NotFound,
    Indeterminate,
}

impl LinkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkStatus::Unchecked => "unchecked",
            LinkStatus::Valid => "valid",
            LinkStatus::Expired => "expired",
            LinkStatus::NotFound => "not_found",
            LinkStatus::Indeterminate => "indeterminate",
        }
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovered download URL plus what validation learned about it.
///
/// Also reads the older report shape (`timestamp`, `request_url`,
/// `query_params`, `file_info`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    #[serde(alias = "timestamp", deserialize_with = "deserialize_timestamp")]
    pub captured_at: DateTime<Utc>,
    #[serde(alias = "request_url")]
    pub source_request_url: String,
    pub download_url: String,
    /// Query of the request that produced the link; replayed on refresh.
    #[serde(default, alias = "query_params", deserialize_with = "deserialize_query_params")]
    pub originating_query_params: QueryParams,
    #[serde(default, alias = "file_info", skip_serializing_if = "Option::is_none")]
    pub file_metadata: Option<Map<String, Value>>,

    #[serde(default)]
    pub status: LinkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
    /// Download URL of the refreshed record that replaced this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<String>,
}

impl LinkRecord {
    pub fn new(
        captured_at: DateTime<Utc>,
        source_request_url: impl Into<String>,
        download_url: impl Into<String>,
        originating_query_params: QueryParams,
        file_metadata: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            captured_at,
            source_request_url: source_request_url.into(),
            download_url: download_url.into(),
            originating_query_params,
            file_metadata,
            status: LinkStatus::Unchecked,
            http_status: None,
            failure: None,
            content_length: None,
            content_type: None,
            filename: None,
            checked_at: None,
            superseded_by: None,
        }
    }

    pub fn decompose(&self, domain: &str) -> DecomposedUrl {
        decompose_for_domain(&self.download_url, domain)
    }
}

/// Extract deduplicated links from `records`, in input order.
pub fn extract(records: &[ExchangeRecord], domain: &str) -> Vec<LinkRecord> {
    let detector = Detector::new(domain);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for record in records {
        let Some(candidate) = detector.detect(&record.response.body) else {
            continue;
        };
        if !decompose_for_domain(&candidate.url, domain).recognized() {
            tracing::debug!(url = %candidate.url, tier = ?candidate.tier, "candidate rejected by host gate");
            continue;
        }
        if !seen.insert(candidate.url.clone()) {
            continue;
        }
        tracing::debug!(
            source = %record.request.url,
            tier = ?candidate.tier,
            "download link found"
        );
        links.push(LinkRecord::new(
            record.request.timestamp,
            record.request.url.clone(),
            candidate.url,
            record.request.query_params.clone(),
            candidate.metadata,
        ));
    }
    links
}

/// Extract over every session log in `dir`, oldest log first. Logs that
/// cannot be read are reported and skipped.
pub fn extract_from_dir(dir: &Path, domain: &str) -> Result<Vec<LinkRecord>> {
    let mut records = Vec::new();
    for path in list_session_logs(dir)? {
        match load_log_file(&path) {
            Ok(mut loaded) => {
                tracing::info!(path = %path.display(), records = loaded.len(), "loaded session log");
                records.append(&mut loaded);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable session log");
            }
        }
    }
    let links = extract(&records, domain);
    tracing::info!(records = records.len(), links = links.len(), "extraction finished");
    Ok(links)
}
