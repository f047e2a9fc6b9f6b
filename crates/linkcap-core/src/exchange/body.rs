//! Body representation and normalization policy.
//!
//! Request and response bodies go through the same policy:
//! declared JSON is parsed (a parse failure degrades to opaque binary),
//! form-url-encoded is split into key → values, anything else is kept as
//! text when it is valid UTF-8 and as an opaque byte count otherwise.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::QueryParams;

/// Normalized message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Body {
    Absent,
    Json(Value),
    Form(QueryParams),
    Text(String),
    Binary { byte_count: usize },
}

impl Body {
    /// Body as text, for the raw-text scan. JSON bodies are serialized.
    pub fn as_scannable_text(&self) -> Option<std::borrow::Cow<'_, str>> {
        match self {
            Body::Text(s) => Some(std::borrow::Cow::Borrowed(s.as_str())),
            Body::Json(v) => serde_json::to_string(v).ok().map(std::borrow::Cow::Owned),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Body::Absent)
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Absent
    }
}

/// Normalizes raw body bytes according to the declared content type.
pub fn normalize_body(content_type: Option<&str>, bytes: &[u8]) -> Body {
    if bytes.is_empty() {
        return Body::Absent;
    }
    let mime = content_type.map(mime_essence).unwrap_or_default();

    if is_json_mime(&mime) {
        return match serde_json::from_slice::<Value>(bytes) {
            Ok(v) => Body::Json(v),
            Err(e) => {
                tracing::debug!(error = %e, "declared JSON body did not parse; keeping byte count");
                Body::Binary {
                    byte_count: bytes.len(),
                }
            }
        };
    }

    if mime == "application/x-www-form-urlencoded" {
        let mut form = QueryParams::new();
        for (k, v) in url::form_urlencoded::parse(bytes) {
            form.entry(k.into_owned()).or_default().push(v.into_owned());
        }
        return Body::Form(form);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => Body::Text(s.to_string()),
        Err(_) => Body::Binary {
            byte_count: bytes.len(),
        },
    }
}

/// `type/subtype` lowercased, parameters dropped.
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn is_json_mime(mime: &str) -> bool {
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Accepts the tagged form written by this crate and the untagged form found
/// in older logs (raw JSON value, plain string, or null).
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Body, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Value::Object(ref map) = value {
        if map.get("kind").map_or(false, Value::is_string) {
            if let Ok(body) = serde_json::from_value::<Body>(value.clone()) {
                return Ok(body);
            }
        }
    }
    Ok(match value {
        Value::Null => Body::Absent,
        Value::String(s) if s.is_empty() => Body::Absent,
        Value::String(s) => Body::Text(s),
        other => Body::Json(other),
    })
}
