//! Human-readable trace of completed exchanges.

use crate::exchange::{Body, ExchangeRecord};

const RULE: &str = "============================================================";

/// One line group per exchange: request line, time, query, bodies, status.
pub fn format_trace_group(record: &ExchangeRecord) -> String {
    let req = &record.request;
    let resp = &record.response;
    let mut out = String::new();

    out.push_str(&format!(
        "\n[{} request] {} {}\n",
        req.scheme.to_ascii_uppercase(),
        req.method,
        req.url
    ));
    out.push_str(&format!("time: {}\n", req.timestamp.to_rfc3339()));
    if !req.query_params.is_empty() {
        let query = serde_json::to_string_pretty(&req.query_params).unwrap_or_default();
        out.push_str(&format!("query: {query}\n"));
    }
    if let Some(body) = describe_body(&req.body) {
        out.push_str(&format!("request body: {body}\n"));
    }

    match resp.elapsed_ms {
        Some(ms) => out.push_str(&format!(
            "[response] {} {} ({ms} ms)\n",
            resp.status_code, resp.status_text
        )),
        None => out.push_str(&format!("[response] {} {}\n", resp.status_code, resp.status_text)),
    }
    if let Some(body) = describe_body(&resp.body) {
        out.push_str(&format!("response body: {body}\n"));
    }
    out.push_str(RULE);
    out.push('\n');
    out
}

fn describe_body(body: &Body) -> Option<String> {
    match body {
        Body::Absent => None,
        Body::Json(v) => Some(serde_json::to_string_pretty(v).unwrap_or_default()),
        Body::Form(f) => Some(serde_json::to_string_pretty(f).unwrap_or_default()),
        Body::Text(t) => Some(t.clone()),
        Body::Binary { byte_count } => Some(format!("<binary: {byte_count} bytes>")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{Headers, RequestRecord, ResponseRecord};

    #[test]
    fn binary_bodies_are_summarized() {
        let record = ExchangeRecord {
            request: RequestRecord {
                timestamp: chrono::Utc::now(),
                monotonic_ns: 0,
                method: "PUT".into(),
                url: "https://up.example/o".into(),
                scheme: "https".into(),
                host: "up.example".into(),
                path: "/o".into(),
                headers: Headers::new(),
                query_params: Default::default(),
                body: Body::Binary { byte_count: 4096 },
                body_size: 4096,
            },
            response: ResponseRecord {
                status_code: 204,
                status_text: "No Content".into(),
                headers: Headers::new(),
                body: Body::Absent,
                body_size: 0,
                elapsed_ms: None,
            },
        };
        let group = format_trace_group(&record);
        assert!(group.starts_with("\n[HTTPS request] PUT https://up.example/o\n"));
        assert!(group.contains("request body: <binary: 4096 bytes>"));
        assert!(group.contains("[response] 204 No Content\n"));
        assert!(!group.contains("response body"));
        assert!(!group.contains("query:"));
    }
}
