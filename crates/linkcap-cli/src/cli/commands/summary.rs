//! `linkcap summary`: statistics and search over one session log.

use anyhow::{Context, Result};
use linkcap_core::config::LinkcapConfig;
use linkcap_core::store::{list_session_logs, load_log_file};
use linkcap_core::summary::{LogSummary, RecordFilter};
use std::path::{Path, PathBuf};

const SHOWN: usize = 10;

pub fn run_summary(cfg: &LinkcapConfig, log: Option<&Path>, filter: &RecordFilter) -> Result<()> {
    let path: PathBuf = match log {
        Some(p) => p.to_path_buf(),
        None => {
            let dir = cfg.session_dir()?;
            list_session_logs(&dir)?
                .pop()
                .with_context(|| format!("no session logs in {}", dir.display()))?
        }
    };
    let records = load_log_file(&path)?;
    println!("{}", path.display());
    print!("{}", LogSummary::from_records(&records));

    let searching = filter.keyword.is_some() || filter.method.is_some() || filter.status_code.is_some();
    if searching {
        let hits = filter.apply(&records);
        println!("matches: {}", hits.len());
        for (i, r) in hits.iter().take(SHOWN).enumerate() {
            println!(
                "[{}] {} {} -> {} {}",
                i + 1,
                r.request.method,
                r.request.url,
                r.response.status_code,
                r.response.status_text
            );
        }
        if hits.len() > SHOWN {
            println!("... {} more", hits.len() - SHOWN);
        }
    }
    Ok(())
}
