//! `linkcap import-har <path>`: replay a HAR into a new capture session.

use anyhow::Result;
use linkcap_core::capture::CaptureEngine;
use linkcap_core::config::LinkcapConfig;
use linkcap_core::har;
use linkcap_core::store::SessionPaths;
use std::path::Path;

pub fn run_import_har(cfg: &LinkcapConfig, path: &Path, session_dir: &Path) -> Result<()> {
    let paths = SessionPaths::starting_now(session_dir);
    let engine = CaptureEngine::start(&paths, &cfg.capture)?;
    let imported = har::import_har(path, &engine);
    let written = engine.finish()?;
    let stats = imported?;
    println!(
        "Imported {} exchanges ({} skipped) into {}",
        stats.imported,
        stats.skipped,
        paths.log.display()
    );
    if written.failed > 0 {
        println!("  {} records could not be written; see the log", written.failed);
    }
    Ok(())
}
