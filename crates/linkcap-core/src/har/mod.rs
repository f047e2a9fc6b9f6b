//! HAR (HTTP Archive) import: replay browser-exported traffic through the
//! capture hooks so it lands in a normal session log.

mod parse;

use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::capture::{CaptureEngine, ExchangeId, RawRequest, RawResponse};

use parse::{HarContent, HarEntry, HarLog, HarPair};

/// Outcome of one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarImportStats {
    pub imported: usize,
    /// Entries without a response (status 0) or with an unusable URL.
    pub skipped: usize,
}

/// Feed every entry of the HAR at `path` to `engine`, in file order.
pub fn import_har(path: &Path, engine: &CaptureEngine) -> Result<HarImportStats> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read HAR file: {}", path.display()))?;
    let har: HarLog = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse HAR JSON: {}", path.display()))?;

    let mut stats = HarImportStats::default();
    for (index, entry) in har.log.entries.into_iter().enumerate() {
        let id = ExchangeId(format!("har-{index}"));
        let url = entry.request.url.clone();
        let Some((request, response)) = to_raw(entry) else {
            tracing::debug!(entry = index, url = %url, "HAR entry skipped");
            stats.skipped += 1;
            continue;
        };
        engine.on_request(id.clone(), request);
        if engine.on_response(id, response) {
            stats.imported += 1;
        } else {
            stats.skipped += 1;
        }
    }
    tracing::info!(
        path = %path.display(),
        imported = stats.imported,
        skipped = stats.skipped,
        "HAR import finished"
    );
    Ok(stats)
}

fn to_raw(entry: HarEntry) -> Option<(RawRequest, RawResponse)> {
    if entry.response.status == 0 {
        return None;
    }
    let req = entry.request;
    let mut headers = pairs(req.headers);
    let body = match req.post_data {
        Some(post) => {
            if let Some(mime) = post.mime_type.filter(|m| !m.is_empty()) {
                if !has_header(&headers, "content-type") {
                    headers.push(("Content-Type".to_string(), mime));
                }
            }
            post.text.unwrap_or_default().into_bytes()
        }
        None => Vec::new(),
    };
    let mut request = match RawRequest::from_url(&req.method, &req.url, headers, body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(url = %req.url, error = %e, "HAR entry has an unusable URL");
            return None;
        }
    };
    if request.query.is_empty() && !req.query_string.is_empty() {
        request.query = pairs(req.query_string);
    }
    request.started_at = entry.started;

    let resp = entry.response;
    let mut headers = pairs(resp.headers);
    let body = match resp.content {
        Some(content) => {
            if let Some(mime) = content.mime_type.as_ref().filter(|m| !m.is_empty()) {
                if !has_header(&headers, "content-type") {
                    headers.push(("Content-Type".to_string(), mime.clone()));
                }
            }
            content_bytes(content)
        }
        None => Vec::new(),
    };
    let response = RawResponse {
        status: resp.status,
        reason: resp.status_text,
        headers,
        body,
    };
    Some((request, response))
}

fn content_bytes(content: HarContent) -> Vec<u8> {
    let text = content.text.unwrap_or_default();
    if content
        .encoding
        .as_deref()
        .is_some_and(|e| e.eq_ignore_ascii_case("base64"))
    {
        match STANDARD.decode(text.trim()) {
            Ok(bytes) => return bytes,
            Err(e) => tracing::warn!(error = %e, "HAR content is not valid base64; keeping text"),
        }
    }
    text.into_bytes()
}

fn pairs(list: Vec<HarPair>) -> Vec<(String, String)> {
    list.into_iter().map(|p| (p.name, p.value)).collect()
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}
