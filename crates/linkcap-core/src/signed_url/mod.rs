//! Structural breakdown of a pre-signed object-storage download URL.
//!
//! [`decompose`] is total: every input yields a [`DecomposedUrl`], and what
//! could not be interpreted is listed in [`DecomposedUrl::anomalies`].

mod layout;
mod params;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;
use url::Url;

use crate::config::DEFAULT_STORAGE_DOMAIN;

pub use layout::PathLayout;
pub use params::{decode_base64_lenient, DecodedPayload, Expiry, SecurityToken, SignedParams};

/// A field the decomposer could not interpret. Recorded, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Anomaly {
    #[error("not a parsable URL: {0}")]
    UnparsableUrl(String),
    #[error("host {host:?} is not under {domain:?}")]
    UnrecognizedHost { host: String, domain: String },
    #[error("expected 3 path segments, found {found}")]
    PathSegmentCount { found: usize },
    #[error("x-oss-expires is not an epoch timestamp: {0:?}")]
    InvalidExpiry(String),
    #[error("{0}: base64 decoding failed")]
    Base64(String),
    #[error("{0}: decoded bytes are not UTF-8")]
    Utf8(String),
    #[error("{0}: decoded text is not JSON")]
    NotJson(String),
    #[error("{0}: repeated parameter, first value kept")]
    DuplicateParam(String),
}

impl Serialize for Anomaly {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecomposedUrl {
    pub input: String,
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub region: Option<String>,
    /// Host sits under the storage domain.
    pub recognized: bool,
    pub path_segments: Vec<String>,
    pub layout: PathLayout,
    /// Every query pair in order of appearance, after one round of decoding.
    pub query: Vec<(String, String)>,
    pub params: SignedParams,
    /// Unrecognized parameters, verbatim.
    pub passthrough: Vec<(String, String)>,
    pub anomalies: Vec<Anomaly>,
}

impl DecomposedUrl {
    pub fn recognized(&self) -> bool {
        self.recognized
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.params.expires.as_ref().and_then(|e| e.at)
    }

    /// `None` when the URL carries no usable expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> Option<bool> {
        self.expires_at().map(|at| at <= now)
    }

    pub fn is_expired(&self) -> Option<bool> {
        self.is_expired_at(Utc::now())
    }

    pub fn filename(&self) -> Option<&str> {
        self.params.filename.as_deref()
    }
}

/// Decompose against the default storage domain.
pub fn decompose(input: &str) -> DecomposedUrl {
    decompose_for_domain(input, DEFAULT_STORAGE_DOMAIN)
}

pub fn decompose_for_domain(input: &str, domain: &str) -> DecomposedUrl {
    let mut out = DecomposedUrl {
        input: input.to_string(),
        ..Default::default()
    };

    let parsed = match Url::parse(input.trim()) {
        Ok(u) => u,
        Err(e) => {
            out.anomalies.push(Anomaly::UnparsableUrl(e.to_string()));
            return out;
        }
    };

    out.scheme = Some(parsed.scheme().to_string());
    let host = parsed.host_str().unwrap_or_default().to_string();
    out.recognized = !host.is_empty() && layout::host_matches(&host, domain);
    if out.recognized {
        out.region = layout::region_from_host(&host, domain);
    } else {
        out.anomalies.push(Anomaly::UnrecognizedHost {
            host: host.clone(),
            domain: domain.to_string(),
        });
    }
    if !host.is_empty() {
        out.host = Some(host);
    }

    out.path_segments = layout::decode_path_segments(parsed.path_segments());
    out.layout = PathLayout::from_segments(&out.path_segments);
    if !PathLayout::is_complete(&out.path_segments) {
        out.anomalies.push(Anomaly::PathSegmentCount {
            found: out.path_segments.len(),
        });
    }

    let mut seen: Vec<&str> = Vec::new();
    out.query = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    for (key, value) in &out.query {
        match params::KNOWN.iter().find(|k| **k == key.as_str()) {
            Some(&known) if seen.contains(&known) => {
                out.anomalies.push(Anomaly::DuplicateParam(key.clone()));
            }
            Some(&known) => {
                seen.push(known);
                out.params.apply(known, value, &mut out.anomalies);
            }
            None => out.passthrough.push((key.clone(), value.clone())),
        }
    }

    out
}
