//! Session-scoped file naming.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

const LOG_PREFIX: &str = "api_requests_";
const TRACE_PREFIX: &str = "console_log_";

/// Files written by one capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    /// JSON Lines exchange log.
    pub log: PathBuf,
    /// Human-readable trace.
    pub trace: PathBuf,
}

impl SessionPaths {
    pub fn new(dir: &Path, started: DateTime<Local>) -> Self {
        let stamp = started.format("%Y%m%d_%H%M%S");
        Self {
            log: dir.join(format!("{LOG_PREFIX}{stamp}.jsonl")),
            trace: dir.join(format!("{TRACE_PREFIX}{stamp}.txt")),
        }
    }

    pub fn starting_now(dir: &Path) -> Self {
        Self::new(dir, Local::now())
    }
}

/// Exchange logs (`api_requests_*.jsonl` / `.json`) in `dir`, oldest first.
/// A missing directory has no logs.
pub fn list_session_logs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("list session dir: {}", dir.display())),
    };
    let mut logs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| {
                    n.starts_with(LOG_PREFIX) && (n.ends_with(".jsonl") || n.ends_with(".json"))
                })
        })
        .collect();
    logs.sort();
    Ok(logs)
}
