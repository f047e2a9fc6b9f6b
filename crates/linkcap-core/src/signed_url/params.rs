//! Decode rules for the recognized signed-URL query parameters.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::Anomaly;
use crate::url_model::{filename_from_disposition, percent_decode};

pub const SECURITY_TOKEN: &str = "security-token";
pub const ACCESS_KEY_ID: &str = "x-oss-access-key-id";
pub const EXPIRES: &str = "x-oss-expires";
pub const SIGNATURE: &str = "x-oss-signature";
pub const CONTENT_DISPOSITION: &str = "response-content-disposition";
pub const PDS_PARAMS: &str = "pds-params";
pub const CALLBACK: &str = "callback";
pub const CALLBACK_VAR: &str = "callback-var";

pub(super) const KNOWN: [&str; 8] = [
    SECURITY_TOKEN,
    ACCESS_KEY_ID,
    EXPIRES,
    SIGNATURE,
    CONTENT_DISPOSITION,
    PDS_PARAMS,
    CALLBACK,
    CALLBACK_VAR,
];

/// A nested payload after decoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DecodedPayload {
    /// Decoded and parsed as JSON.
    Json(Value),
    /// Decoded to text that is not JSON; kept as-is.
    Text(String),
    /// Could not be decoded at all; the raw parameter value.
    Undecodable(String),
}

impl DecodedPayload {
    /// The payload as a non-empty JSON object, if it is one.
    pub fn as_object(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            DecodedPayload::Json(Value::Object(map)) if !map.is_empty() => Some(map),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityToken {
    pub value: String,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expiry {
    pub raw: String,
    pub at: Option<DateTime<Utc>>,
}

/// Decoded view of the recognized parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignedParams {
    pub security_token: Option<SecurityToken>,
    pub access_key_id: Option<String>,
    pub expires: Option<Expiry>,
    pub signature: Option<String>,
    pub content_disposition: Option<String>,
    /// Filename named by `response-content-disposition`, sanitized.
    pub filename: Option<String>,
    pub pds_params: Option<DecodedPayload>,
    pub callback: Option<DecodedPayload>,
    pub callback_var: Option<DecodedPayload>,
}

impl SignedParams {
    /// Apply the decode rule for one recognized parameter. `value` has already
    /// been through one round of query-string decoding.
    pub(super) fn apply(&mut self, key: &str, value: &str, anomalies: &mut Vec<Anomaly>) {
        match key {
            SECURITY_TOKEN => {
                self.security_token = Some(SecurityToken {
                    value: value.to_string(),
                    length: value.chars().count(),
                })
            }
            ACCESS_KEY_ID => self.access_key_id = Some(value.to_string()),
            SIGNATURE => self.signature = Some(value.to_string()),
            EXPIRES => {
                let at = value
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
                if at.is_none() {
                    anomalies.push(Anomaly::InvalidExpiry(value.to_string()));
                }
                self.expires = Some(Expiry {
                    raw: value.to_string(),
                    at,
                });
            }
            CONTENT_DISPOSITION => {
                let decoded = percent_decode(value);
                self.filename = filename_from_disposition(&decoded);
                self.content_disposition = Some(decoded);
            }
            PDS_PARAMS => {
                let decoded = percent_decode(value);
                self.pds_params = Some(parse_json_text(PDS_PARAMS, decoded, anomalies));
            }
            CALLBACK => self.callback = Some(decode_base64_json(CALLBACK, value, anomalies)),
            CALLBACK_VAR => {
                self.callback_var = Some(decode_base64_json(CALLBACK_VAR, value, anomalies))
            }
            _ => {}
        }
    }
}

/// URL-decode, base64-decode with padding repair, then JSON-parse.
fn decode_base64_json(param: &str, value: &str, anomalies: &mut Vec<Anomaly>) -> DecodedPayload {
    let url_decoded = percent_decode(value);
    let Some(bytes) = decode_base64_lenient(&url_decoded) else {
        anomalies.push(Anomaly::Base64(param.to_string()));
        return DecodedPayload::Undecodable(value.to_string());
    };
    match String::from_utf8(bytes) {
        Ok(text) => parse_json_text(param, text, anomalies),
        Err(_) => {
            anomalies.push(Anomaly::Utf8(param.to_string()));
            DecodedPayload::Undecodable(value.to_string())
        }
    }
}

fn parse_json_text(param: &str, text: String, anomalies: &mut Vec<Anomaly>) -> DecodedPayload {
    match serde_json::from_str::<Value>(&text) {
        Ok(v) => DecodedPayload::Json(v),
        Err(_) => {
            anomalies.push(Anomaly::NotJson(param.to_string()));
            DecodedPayload::Text(text)
        }
    }
}

/// Base64 decode tolerant of missing padding, stray whitespace, and `+`
/// turned into a space by form decoding. Tries the standard alphabet, then
/// the URL-safe one.
pub fn decode_base64_lenient(input: &str) -> Option<Vec<u8>> {
    let mut cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .map(|c| if c == ' ' { '+' } else { c })
        .collect();
    let unpadded_len = cleaned.trim_end_matches('=').len();
    cleaned.truncate(unpadded_len);
    if cleaned.is_empty() {
        return None;
    }
    while cleaned.len() % 4 != 0 {
        cleaned.push('=');
    }
    STANDARD
        .decode(cleaned.as_bytes())
        .or_else(|_| URL_SAFE.decode(cleaned.as_bytes()))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_missing_padding_is_repaired() {
        // {"a":1} is eyJhIjoxfQ== when padded.
        assert_eq!(decode_base64_lenient("eyJhIjoxfQ").unwrap(), br#"{"a":1}"#);
        assert_eq!(decode_base64_lenient("eyJhIjoxfQ==").unwrap(), br#"{"a":1}"#);
        assert_eq!(decode_base64_lenient("eyJhIjoxfQ=").unwrap(), br#"{"a":1}"#);
    }

    #[test]
    fn base64_space_is_plus() {
        let plus = STANDARD.encode([0xfb, 0xff]);
        assert_eq!(plus, "+/8=");
        assert_eq!(decode_base64_lenient(" /8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn base64_garbage_is_none() {
        assert!(decode_base64_lenient("").is_none());
        assert!(decode_base64_lenient("a").is_none());
        assert!(decode_base64_lenient("!!!!").is_none());
    }

    #[test]
    fn callback_keeps_non_json_text() {
        let mut anomalies = Vec::new();
        let encoded = STANDARD.encode("plain words");
        let payload = decode_base64_json(CALLBACK, &encoded, &mut anomalies);
        assert_eq!(payload, DecodedPayload::Text("plain words".into()));
        assert_eq!(anomalies, vec![Anomaly::NotJson(CALLBACK.into())]);
    }

    #[test]
    fn invalid_expiry_is_reported() {
        let mut params = SignedParams::default();
        let mut anomalies = Vec::new();
        params.apply(EXPIRES, "tomorrow", &mut anomalies);
        assert_eq!(params.expires.as_ref().unwrap().at, None);
        assert_eq!(anomalies, vec![Anomaly::InvalidExpiry("tomorrow".into())]);
    }
}
