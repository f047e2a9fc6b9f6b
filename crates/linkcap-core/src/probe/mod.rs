//! Header-only liveness probing of download links.
//!
//! Uses the curl crate (libcurl) for a HEAD request with a bounded timeout
//! and a browser-like user agent. Transport failures never surface as errors:
//! they classify the link as indeterminate.

mod classify;
mod parse;

use std::str;
use std::time::Duration;

use chrono::Utc;

use crate::config::ProbeConfig;
use crate::extract::{LinkRecord, LinkStatus};
use crate::signed_url::decompose;
use crate::url_model::filename_from_disposition;

pub use classify::{classify_status, ProbeFailure};
pub use parse::HeadHeaders;

/// What one probe learned about a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: LinkStatus,
    pub http_status: Option<u16>,
    /// Set for indeterminate outcomes.
    pub failure: Option<String>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

impl ProbeOutcome {
    fn from_failure(failure: &ProbeFailure) -> Self {
        Self {
            status: LinkStatus::Indeterminate,
            http_status: None,
            failure: Some(failure.to_string()),
            content_length: None,
            content_type: None,
            filename: None,
        }
    }

    /// Copies the outcome onto `link` and stamps the check time.
    pub fn apply_to(self, link: &mut LinkRecord) {
        link.status = self.status;
        link.http_status = self.http_status;
        link.failure = self.failure;
        link.content_length = self.content_length;
        link.content_type = self.content_type;
        link.filename = self.filename;
        link.checked_at = Some(Utc::now());
    }
}

/// Probes `url` and classifies the result.
///
/// Runs in the current thread; call from `spawn_blocking` in async code.
pub fn probe_url(url: &str, config: &ProbeConfig) -> ProbeOutcome {
    let (code, headers) = match head(url, config) {
        Ok(r) => r,
        Err(failure) => {
            tracing::warn!(url = %url, error = %failure, "probe failed");
            return ProbeOutcome::from_failure(&failure);
        }
    };

    let status = classify_status(code);
    let http_status = u16::try_from(code).ok();
    tracing::debug!(url = %url, code, status = %status, "probe finished");

    if status != LinkStatus::Valid {
        let failure = (status == LinkStatus::Indeterminate).then(|| format!("HTTP {code}"));
        return ProbeOutcome {
            status,
            http_status,
            failure,
            content_length: None,
            content_type: None,
            filename: None,
        };
    }

    let filename = headers
        .content_disposition
        .as_deref()
        .and_then(filename_from_disposition)
        .or_else(|| decompose(url).params.filename);

    ProbeOutcome {
        status,
        http_status,
        failure: None,
        content_length: headers.content_length,
        content_type: headers.content_type,
        filename,
    }
}

/// Probes the link's URL and records the outcome on it.
pub fn probe_link(link: &mut LinkRecord, config: &ProbeConfig) {
    probe_url(&link.download_url, config).apply_to(link);
}

/// HEAD request returning the final status code and that response's headers.
fn head(url: &str, config: &ProbeConfig) -> Result<(u32, HeadHeaders), ProbeFailure> {
    let mut lines: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(ProbeFailure::from_curl)?;
    easy.nobody(true).map_err(ProbeFailure::from_curl)?;
    easy.follow_location(config.follow_redirects)
        .map_err(ProbeFailure::from_curl)?;
    easy.max_redirections(10).map_err(ProbeFailure::from_curl)?;
    easy.useragent(&config.user_agent)
        .map_err(ProbeFailure::from_curl)?;
    easy.connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .map_err(ProbeFailure::from_curl)?;
    easy.timeout(Duration::from_secs(config.timeout_secs))
        .map_err(ProbeFailure::from_curl)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    lines.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(ProbeFailure::from_curl)?;
        transfer.perform().map_err(ProbeFailure::from_curl)?;
    }

    let code = easy.response_code().map_err(ProbeFailure::from_curl)?;
    Ok((code, parse::parse_headers(&lines)))
}
