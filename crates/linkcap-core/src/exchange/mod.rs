//! Canonical structured representation of one captured request/response pair.

mod body;
mod headers;

pub use body::{normalize_body, Body};
pub use headers::Headers;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Query parameters: key → values in the order they appeared.
pub type QueryParams = BTreeMap<String, Vec<String>>;

/// One completed exchange. Immutable once written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub request: RequestRecord,
    pub response: ResponseRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Wall-clock capture time.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Nanoseconds since the capture engine started; orders exchanges within a session.
    #[serde(default)]
    pub monotonic_ns: u64,
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub scheme: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, deserialize_with = "deserialize_query_params")]
    pub query_params: QueryParams,
    #[serde(default, deserialize_with = "body::deserialize_lenient")]
    pub body: Body,
    #[serde(default)]
    pub body_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub status_code: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, deserialize_with = "body::deserialize_lenient")]
    pub body: Body,
    #[serde(default)]
    pub body_size: usize,
    /// Time between the request and response hooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl ExchangeRecord {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.response.status_code)
    }
}

/// RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Older logs store a single string per key instead of a list.
pub(crate) fn deserialize_query_params<'de, D>(deserializer: D) -> Result<QueryParams, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let raw = Option::<BTreeMap<String, OneOrMany>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let values = match v {
                OneOrMany::One(s) => vec![s],
                OneOrMany::Many(list) => list,
            };
            (k, values)
        })
        .collect())
}
