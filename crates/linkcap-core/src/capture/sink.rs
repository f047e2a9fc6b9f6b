//! Single-writer queue feeding the exchange store and the trace file.
//!
//! Hooks submit completed records without waiting for disk I/O; one writer
//! thread drains the queue in submission order, so both sinks see exchanges
//! in the same order.

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::mpsc;
use std::thread::JoinHandle;

use super::trace::format_trace_group;
use crate::exchange::ExchangeRecord;
use crate::store::ExchangeStore;

/// Totals reported when the sink is closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Records durably appended to the exchange log.
    pub written: u64,
    /// Records whose append failed (logged, not retried).
    pub failed: u64,
}

pub struct CaptureSink {
    tx: mpsc::Sender<ExchangeRecord>,
    worker: JoinHandle<SinkStats>,
}

impl CaptureSink {
    pub fn spawn(store: ExchangeStore, trace: Box<dyn Write + Send>) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<ExchangeRecord>();
        let worker = std::thread::Builder::new()
            .name("linkcap-capture-writer".into())
            .spawn(move || run_writer(rx, store, trace))
            .context("spawn capture writer thread")?;
        Ok(Self { tx, worker })
    }

    /// Queue a completed exchange. Never blocks on I/O.
    pub fn submit(&self, record: ExchangeRecord) {
        if self.tx.send(record).is_err() {
            tracing::error!("capture writer has stopped; exchange dropped");
        }
    }

    /// Close the queue and wait for every queued record to be written.
    pub fn close(self) -> Result<SinkStats> {
        drop(self.tx);
        self.worker
            .join()
            .map_err(|_| anyhow::anyhow!("capture writer thread panicked"))
    }
}

fn run_writer(
    rx: mpsc::Receiver<ExchangeRecord>,
    store: ExchangeStore,
    mut trace: Box<dyn Write + Send>,
) -> SinkStats {
    let mut stats = SinkStats::default();
    for record in rx {
        match store.append(&record) {
            Ok(()) => stats.written += 1,
            Err(e) => {
                stats.failed += 1;
                tracing::warn!(error = %e, url = %record.request.url, "exchange append failed");
            }
        }
        let group = format_trace_group(&record);
        if let Err(e) = trace.write_all(group.as_bytes()).and_then(|_| trace.flush()) {
            tracing::warn!(error = %e, "trace write failed");
        }
    }
    tracing::info!(written = stats.written, failed = stats.failed, "capture writer drained");
    stats
}
