//! Statistics and search over a captured exchange log.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use serde::Serialize;

use crate::exchange::{Body, ExchangeRecord};

/// Totals per host, method, and status, each sorted by descending count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogSummary {
    pub total: usize,
    pub hosts: Vec<(String, usize)>,
    pub methods: Vec<(String, usize)>,
    pub statuses: Vec<(u16, usize)>,
}

impl LogSummary {
    pub fn from_records(records: &[ExchangeRecord]) -> Self {
        let mut hosts = HashMap::new();
        let mut methods = HashMap::new();
        let mut statuses = HashMap::new();
        for r in records {
            let host = if r.request.host.is_empty() {
                "unknown".to_string()
            } else {
                r.request.host.clone()
            };
            *hosts.entry(host).or_insert(0) += 1;
            *methods.entry(r.request.method.to_ascii_uppercase()).or_insert(0) += 1;
            *statuses.entry(r.response.status_code).or_insert(0) += 1;
        }
        Self {
            total: records.len(),
            hosts: ranked(hosts),
            methods: ranked(methods),
            statuses: ranked(statuses),
        }
    }
}

fn ranked<K: Ord + Hash>(counts: HashMap<K, usize>) -> Vec<(K, usize)> {
    let mut v: Vec<_> = counts.into_iter().collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    v
}

impl fmt::Display for LogSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total exchanges: {}", self.total)?;
        writeln!(f, "hosts:")?;
        for (host, n) in &self.hosts {
            writeln!(f, "  {host}: {n}")?;
        }
        writeln!(f, "methods:")?;
        for (method, n) in &self.methods {
            writeln!(f, "  {method}: {n}")?;
        }
        writeln!(f, "status codes:")?;
        for (code, n) in &self.statuses {
            writeln!(f, "  {code}: {n}")?;
        }
        Ok(())
    }
}

/// Search criteria; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Case-insensitive substring of the URL, host, or either body.
    pub keyword: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<u16>,
}

impl RecordFilter {
    pub fn matches(&self, record: &ExchangeRecord) -> bool {
        if let Some(method) = &self.method {
            if !record.request.method.eq_ignore_ascii_case(method) {
                return false;
            }
        }
        if let Some(code) = self.status_code {
            if record.response.status_code != code {
                return false;
            }
        }
        match &self.keyword {
            Some(k) if !k.is_empty() => keyword_hit(record, &k.to_lowercase()),
            _ => true,
        }
    }

    pub fn apply<'a>(&self, records: &'a [ExchangeRecord]) -> Vec<&'a ExchangeRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

fn keyword_hit(record: &ExchangeRecord, needle: &str) -> bool {
    let body_hit = |body: &Body| {
        body.as_scannable_text()
            .is_some_and(|t| t.to_lowercase().contains(needle))
    };
    record.request.url.to_lowercase().contains(needle)
        || record.request.host.to_lowercase().contains(needle)
        || body_hit(&record.request.body)
        || body_hit(&record.response.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::record_with_body;
    use serde_json::json;

    fn sample() -> Vec<ExchangeRecord> {
        let mut a = record_with_body("https://api.example.com/api.php?fid=1", Body::Json(json!({"url": "https://x.aliyundrive.net/a"})));
        a.request.method = "get".into();
        let mut b = record_with_body("https://cdn.example.org/file", Body::Text("Not Found".into()));
        b.response.status_code = 404;
        let mut c = record_with_body("https://api.example.com/login", Body::Absent);
        c.request.method = "POST".into();
        vec![a, b, c]
    }

    #[test]
    fn summary_counts_and_ranks() {
        let s = LogSummary::from_records(&sample());
        assert_eq!(s.total, 3);
        assert_eq!(
            s.hosts,
            vec![("api.example.com".to_string(), 2), ("cdn.example.org".to_string(), 1)]
        );
        assert_eq!(s.methods, vec![("GET".to_string(), 2), ("POST".to_string(), 1)]);
        assert_eq!(s.statuses, vec![(200, 2), (404, 1)]);
        assert!(s.to_string().contains("  api.example.com: 2"));
    }

    #[test]
    fn filter_by_keyword_in_body() {
        let records = sample();
        let f = RecordFilter {
            keyword: Some("ALIYUNDRIVE".into()),
            ..Default::default()
        };
        let hits = f.apply(&records);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].request.path, "/api.php");
    }

    #[test]
    fn filter_by_method_and_status() {
        let records = sample();
        let get = RecordFilter {
            method: Some("GET".into()),
            ..Default::default()
        };
        assert_eq!(get.apply(&records).len(), 2);
        let missing = RecordFilter {
            method: Some("get".into()),
            status_code: Some(404),
            ..Default::default()
        };
        assert_eq!(missing.apply(&records).len(), 1);
        assert_eq!(RecordFilter::default().apply(&records).len(), 3);
    }
}
