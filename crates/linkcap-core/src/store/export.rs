//! Atomic whole-file writes (temp file in the destination directory, then rename).

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::exchange::ExchangeRecord;

/// Serialize `value` as pretty JSON and atomically replace `dest` with it.
///
/// Readers see either the previous file or the complete new one.
pub fn write_json_atomic<T: Serialize + ?Sized>(value: &T, dest: &Path) -> Result<()> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("create dir: {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut tmp, value).context("serialize JSON")?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all().context("sync temp file")?;
    tmp.persist(dest)
        .map_err(|e| e.error)
        .with_context(|| format!("rename into place: {}", dest.display()))?;
    Ok(())
}

/// Write a session's records as one JSON array (the interchange form).
pub fn write_json_array(records: &[ExchangeRecord], dest: &Path) -> Result<()> {
    write_json_atomic(records, dest)
}
