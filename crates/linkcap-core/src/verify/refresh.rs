//! Re-minting expired links by replaying their original query parameters.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use serde_json::Value;
use url::Url;

use crate::config::RefreshConfig;
use crate::exchange::QueryParams;
use crate::extract::{LinkRecord, LinkStatus};
use crate::probe::ProbeFailure;
use crate::signed_url::decompose_for_domain;

/// The minting endpoint with `params` appended to whatever query it already has.
pub fn minting_url(endpoint: &str, params: &QueryParams) -> Result<Url> {
    let mut url = Url::parse(endpoint).with_context(|| format!("minting endpoint: {endpoint}"))?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, values) in params {
            for value in values {
                pairs.append_pair(key, value);
            }
        }
    }
    Ok(url)
}

/// Obtain a fresh link for an expired one. `None` when the link is not
/// expired or the endpoint does not hand back an admissible `url`; the
/// returned record is unchecked.
pub fn refresh(link: &LinkRecord, config: &RefreshConfig, domain: &str) -> Option<LinkRecord> {
    if link.status != LinkStatus::Expired {
        tracing::debug!(url = %link.download_url, status = %link.status, "refresh skipped; link not expired");
        return None;
    }
    match mint(link, config, domain) {
        Ok(fresh) => {
            tracing::info!(source = %link.source_request_url, "link re-minted");
            Some(fresh)
        }
        Err(e) => {
            tracing::warn!(source = %link.source_request_url, error = %format!("{e:#}"), "refresh failed");
            None
        }
    }
}

fn mint(link: &LinkRecord, config: &RefreshConfig, domain: &str) -> Result<LinkRecord> {
    let url = minting_url(&config.endpoint, &link.originating_query_params)?;
    let (code, body) = get(url.as_str(), config)?;
    if !(200..300).contains(&code) {
        bail!("minting endpoint returned HTTP {code}");
    }
    let value: Value = serde_json::from_slice(&body).context("minting response is not JSON")?;
    let obj = value
        .as_object()
        .ok_or_else(|| anyhow!("minting response is not a JSON object"))?;
    let fresh_url = obj
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| anyhow!("minting response has no url field"))?;
    if !decompose_for_domain(fresh_url, domain).recognized() {
        bail!("minted url is not under {domain}");
    }
    let metadata: serde_json::Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| k.as_str() != "url")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(LinkRecord::new(
        Utc::now(),
        url.as_str(),
        fresh_url,
        link.originating_query_params.clone(),
        (!metadata.is_empty()).then_some(metadata),
    ))
}

/// Plain GET returning the status and body.
fn get(url: &str, config: &RefreshConfig) -> Result<(u32, Vec<u8>), ProbeFailure> {
    let mut body = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(ProbeFailure::from_curl)?;
    easy.get(true).map_err(ProbeFailure::from_curl)?;
    easy.follow_location(true).map_err(ProbeFailure::from_curl)?;
    easy.useragent(&config.user_agent)
        .map_err(ProbeFailure::from_curl)?;
    easy.timeout(Duration::from_secs(config.timeout_secs))
        .map_err(ProbeFailure::from_curl)?;
    let mut list = curl::easy::List::new();
    list.append("Accept: application/json, text/plain, */*")
        .map_err(ProbeFailure::from_curl)?;
    easy.http_headers(list).map_err(ProbeFailure::from_curl)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(ProbeFailure::from_curl)?;
        transfer.perform().map_err(ProbeFailure::from_curl)?;
    }

    let code = easy.response_code().map_err(ProbeFailure::from_curl)?;
    Ok((code, body))
}
