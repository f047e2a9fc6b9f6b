//! `linkcap export <log> <output>`: session log as one JSON array.

use anyhow::Result;
use linkcap_core::store::{load_log_file, write_json_array};
use std::path::Path;

pub fn run_export(log: &Path, output: &Path) -> Result<()> {
    let records = load_log_file(log)?;
    write_json_array(&records, output)?;
    println!("Exported {} exchanges to {}", records.len(), output.display());
    Ok(())
}
