//! `linkcap verify`: probe links from a result file and refresh expired ones.

use anyhow::Result;
use linkcap_core::config::LinkcapConfig;
use linkcap_core::extract::LinkReport;
use linkcap_core::verify::{verify_links, VerifySummary};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::extract::shorten;

pub async fn run_verify(
    cfg: &LinkcapConfig,
    links_file: &Path,
    output: &Path,
    no_refresh: bool,
) -> Result<()> {
    let report = LinkReport::load(links_file)?;
    let refresh_cfg = if no_refresh { None } else { cfg.refresh.as_ref() };
    if refresh_cfg.is_none() && !no_refresh {
        tracing::info!("no [refresh] endpoint configured; expired links will not be re-minted");
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted; finishing probes already in flight");
            flag.store(true, Ordering::Relaxed);
        }
    });

    let links = verify_links(
        report.links,
        &cfg.probe,
        refresh_cfg,
        &cfg.storage_domain,
        cancel,
    )
    .await;

    for link in &links {
        let code = link
            .http_status
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<14} {:<4} {}", link.status.as_str(), code, shorten(&link.download_url, 80));
        if let Some(name) = &link.filename {
            println!("{:<19} file: {name}", "");
        }
        if let Some(failure) = &link.failure {
            println!("{:<19} {failure}", "");
        }
    }

    let summary = VerifySummary::from_links(&links);
    println!("{summary}");
    LinkReport::new(links).save(output)?;
    println!("Saved verified links to {}", output.display());
    Ok(())
}
