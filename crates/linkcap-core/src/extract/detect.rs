//! Tiered download-URL detection over one response body.

use regex::Regex;
use serde_json::{Map, Value};

use crate::exchange::Body;
use crate::signed_url::decompose_for_domain;

/// Which heuristic produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// `url` field of a structured body.
    Field,
    /// `url` field of a text body that parses as JSON.
    JsonText,
    /// Pattern scan over the raw text.
    Scan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub url: String,
    pub tier: Tier,
    /// The object that carried the `url` field, minus the field itself.
    pub metadata: Option<Map<String, Value>>,
}

pub struct Detector {
    domain: String,
    pattern: Option<Regex>,
}

impl Detector {
    pub fn new(domain: &str) -> Self {
        // The domain has to end the authority; group 1 is the URL, and the
        // trailing class stops `<domain>foo` from matching as `<domain>`.
        let source = format!(
            r##"(https://(?:[^/?#"'<>\s\\]+\.)?{}(?:[:/?#][^"'<>\s\\]*)?)(?:["'<>\s\\]|$)"##,
            regex::escape(domain.trim_start_matches('.'))
        );
        let pattern = match Regex::new(&source) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(error = %e, "URL scan pattern did not compile; text scan disabled");
                None
            }
        };
        Self {
            domain: domain.to_string(),
            pattern,
        }
    }

    /// First tier that yields a candidate wins.
    pub fn detect(&self, body: &Body) -> Option<Candidate> {
        match body {
            Body::Json(Value::Object(obj)) => {
                from_object(obj, Tier::Field).or_else(|| self.scan(body))
            }
            Body::Form(form) => form
                .get("url")
                .and_then(|values| values.first())
                .filter(|u| !u.is_empty())
                .map(|u| Candidate {
                    url: u.clone(),
                    tier: Tier::Field,
                    metadata: None,
                }),
            Body::Text(text) => {
                let parsed = serde_json::from_str::<Value>(text).ok();
                parsed
                    .as_ref()
                    .and_then(Value::as_object)
                    .and_then(|obj| from_object(obj, Tier::JsonText))
                    .or_else(|| self.scan(body))
            }
            Body::Json(_) => self.scan(body),
            Body::Absent | Body::Binary { .. } => None,
        }
    }

    fn scan(&self, body: &Body) -> Option<Candidate> {
        let pattern = self.pattern.as_ref()?;
        let text = body.as_scannable_text()?;
        pattern
            .captures_iter(&text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .find(|url| decompose_for_domain(url, &self.domain).recognized())
            .map(|url| Candidate {
                url: url.to_string(),
                tier: Tier::Scan,
                metadata: None,
            })
    }
}

fn from_object(obj: &Map<String, Value>, tier: Tier) -> Option<Candidate> {
    let url = obj.get("url")?.as_str()?.trim();
    if url.is_empty() {
        return None;
    }
    let metadata: Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| k.as_str() != "url")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Some(Candidate {
        url: url.to_string(),
        tier,
        metadata: (!metadata.is_empty()).then_some(metadata),
    })
}
