//! Capture engine: turns raw proxied request/response events into
//! [`ExchangeRecord`]s and hands completed pairs to the store and trace sinks.
//!
//! The proxy collaborator calls [`CaptureEngine::on_request`] and
//! [`CaptureEngine::on_response`] from any number of worker threads,
//! correlating the two with its own opaque [`ExchangeId`]. Each pending
//! request is owned by its entry in the pending table until the matching
//! response removes it; no state is shared between exchanges.

mod sink;
mod trace;

pub use sink::{CaptureSink, SinkStats};
pub use trace::format_trace_group;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::config::CaptureConfig;
use crate::exchange::{
    normalize_body, ExchangeRecord, Headers, QueryParams, RequestRecord, ResponseRecord,
};
use crate::store::{ExchangeStore, SessionPaths};

/// Opaque per-exchange correlation token supplied by the proxy collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExchangeId(pub String);

impl From<&str> for ExchangeId {
    fn from(s: &str) -> Self {
        ExchangeId(s.to_string())
    }
}

impl From<u64> for ExchangeId {
    fn from(n: u64) -> Self {
        ExchangeId(n.to_string())
    }
}

/// Request as delivered by the proxy hook.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub method: String,
    pub url: String,
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Wall-clock time the request was sent, when the hook knows it better
    /// than the engine does (replayed archives). Defaults to now.
    pub started_at: Option<DateTime<Utc>>,
}

impl RawRequest {
    /// Build a raw request from a full URL, deriving scheme/host/path/query.
    pub fn from_url(
        method: &str,
        url: &str,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Result<Self> {
        let parsed = url::Url::parse(url).with_context(|| format!("invalid request URL: {url}"))?;
        Ok(Self {
            method: method.to_string(),
            url: url.to_string(),
            scheme: parsed.scheme().to_string(),
            host: parsed.host_str().unwrap_or_default().to_string(),
            path: parsed.path().to_string(),
            headers,
            query: parsed
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            body,
            started_at: None,
        })
    }
}

/// Response as delivered by the proxy hook.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

struct Pending {
    request: RequestRecord,
    started: Instant,
}

/// Correlates request/response events and emits completed exchanges.
pub struct CaptureEngine {
    pending: Mutex<HashMap<ExchangeId, Pending>>,
    sink: CaptureSink,
    epoch: Instant,
}

impl CaptureEngine {
    /// Start a session: open the exchange log and trace file and spawn the writer.
    pub fn start(paths: &SessionPaths, cfg: &CaptureConfig) -> Result<Self> {
        let store = ExchangeStore::open(&paths.log)?.with_sync(cfg.sync_each_append);
        let trace = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&paths.trace)
            .with_context(|| format!("open trace file: {}", paths.trace.display()))?;
        tracing::info!(
            log = %paths.log.display(),
            trace = %paths.trace.display(),
            "capture session started"
        );
        Ok(Self::with_sink(CaptureSink::spawn(store, Box::new(trace))?))
    }

    pub fn with_sink(sink: CaptureSink) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            sink,
            epoch: Instant::now(),
        }
    }

    /// Request hook: normalize and stage the request until its response arrives.
    pub fn on_request(&self, id: ExchangeId, raw: RawRequest) {
        let request = self.build_request(raw);
        tracing::debug!(exchange = %id.0, method = %request.method, url = %request.url, "request staged");
        let pending = Pending {
            request,
            started: Instant::now(),
        };
        if self.lock_pending().insert(id.clone(), pending).is_some() {
            tracing::warn!(exchange = %id.0, "request hook fired twice; keeping the latest");
        }
    }

    /// Response hook: complete the exchange and queue it for persistence.
    ///
    /// Returns false when no request is pending for `id`; such a response is
    /// not persisted.
    pub fn on_response(&self, id: ExchangeId, raw: RawResponse) -> bool {
        let Some(pending) = self.lock_pending().remove(&id) else {
            tracing::warn!(exchange = %id.0, status = raw.status, "response without pending request; dropped");
            return false;
        };
        let headers: Headers = raw.headers.into_iter().collect();
        let body = normalize_body(headers.content_type(), &raw.body);
        let response = ResponseRecord {
            status_code: raw.status,
            status_text: raw.reason,
            headers,
            body,
            body_size: raw.body.len(),
            elapsed_ms: Some(pending.started.elapsed().as_millis() as u64),
        };
        tracing::debug!(exchange = %id.0, status = response.status_code, "exchange complete");
        self.sink.submit(ExchangeRecord {
            request: pending.request,
            response,
        });
        true
    }

    /// Discard a staged request whose exchange failed upstream.
    pub fn abandon(&self, id: &ExchangeId) -> bool {
        self.lock_pending().remove(id).is_some()
    }

    /// Requests still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    /// Stop accepting exchanges, wait for queued writes, and report totals.
    /// Requests still pending are incomplete and are not persisted.
    pub fn finish(self) -> Result<SinkStats> {
        let unmatched = self.pending_count();
        if unmatched > 0 {
            tracing::info!(unmatched, "discarding requests without responses");
        }
        self.sink.close()
    }

    fn build_request(&self, raw: RawRequest) -> RequestRecord {
        let headers: Headers = raw.headers.into_iter().collect();
        let body = normalize_body(headers.content_type(), &raw.body);
        let mut query_params = QueryParams::new();
        for (k, v) in raw.query {
            query_params.entry(k).or_default().push(v);
        }
        RequestRecord {
            timestamp: raw.started_at.unwrap_or_else(Utc::now),
            monotonic_ns: self.epoch.elapsed().as_nanos() as u64,
            method: raw.method,
            url: raw.url,
            scheme: raw.scheme,
            host: raw.host,
            path: raw.path,
            headers,
            query_params,
            body,
            body_size: raw.body.len(),
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<ExchangeId, Pending>> {
        self.pending.lock().unwrap_or_else(|p| p.into_inner())
    }
}
