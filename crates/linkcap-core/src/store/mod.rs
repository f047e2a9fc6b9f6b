//! Durable, append-only exchange log.
//!
//! Each completed exchange is one JSON line appended to the session log under
//! a writer lock. Earlier lines are never rewritten, so an interrupted append
//! can only damage the line being written; `load_all` skips such a tail.

mod export;
mod session;

pub use export::{write_json_array, write_json_atomic};
pub use session::{list_session_logs, SessionPaths};

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::exchange::ExchangeRecord;

/// Handle to one session's exchange log.
#[derive(Debug)]
pub struct ExchangeStore {
    path: PathBuf,
    file: Mutex<File>,
    sync_each_append: bool,
}

impl ExchangeStore {
    /// Open (or create) the log at `path`, creating parent directories.
    ///
    /// If a previous run was interrupted mid-append the file may end without a
    /// newline; a newline is written first so the next record starts clean.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let open_err = |source| StoreError::Open {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(open_err)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(open_err)?;

        let len = file.metadata().map_err(open_err)?.len();
        if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::Start(len - 1)).map_err(open_err)?;
            file.read_exact(&mut last).map_err(open_err)?;
            if last[0] != b'\n' {
                tracing::warn!(path = %path.display(), "exchange log ends mid-record; sealing tail");
                file.write_all(b"\n").map_err(open_err)?;
            }
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
            sync_each_append: true,
        })
    }

    /// Whether each append is followed by an fsync (default true).
    pub fn with_sync(mut self, sync_each_append: bool) -> Self {
        self.sync_each_append = sync_each_append;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably add one completed record. Concurrent callers are serialized.
    pub fn append(&self, record: &ExchangeRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let append_err = |source| StoreError::Append {
            path: self.path.clone(),
            source,
        };
        let mut file = self.file.lock().unwrap_or_else(|p| p.into_inner());
        file.write_all(&line).map_err(append_err)?;
        if self.sync_each_append {
            file.sync_data().map_err(append_err)?;
        }
        Ok(())
    }

    /// All complete records in the log, oldest first.
    pub fn load_all(&self) -> Result<Vec<ExchangeRecord>> {
        load_log_file(&self.path)
    }
}

/// Load every record from a log file.
///
/// Accepts the JSON Lines session log and the single-JSON-array export form.
/// A missing file is empty; an unreadable file is an error. An array that
/// does not parse yields zero records, and malformed or unterminated lines
/// are skipped.
pub fn load_log_file(path: &Path) -> Result<Vec<ExchangeRecord>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("read exchange log: {}", path.display())),
    };

    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    if first == Some(&b'[') {
        return Ok(match serde_json::from_slice::<Vec<ExchangeRecord>>(&bytes) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "exchange log array did not parse; recovering zero records");
                Vec::new()
            }
        });
    }

    let complete = match bytes.iter().rposition(|b| *b == b'\n') {
        Some(end) => &bytes[..=end],
        None => &bytes[..0],
    };
    if complete.len() < bytes.len() {
        tracing::warn!(path = %path.display(), "ignoring unterminated last line");
    }

    let mut records = Vec::new();
    for (idx, line) in complete.split(|b| *b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<ExchangeRecord>(line) {
            Ok(r) => records.push(r),
            Err(e) => {
                tracing::warn!(path = %path.display(), line = idx + 1, error = %e, "skipping malformed exchange line");
            }
        }
    }
    Ok(records)
}
