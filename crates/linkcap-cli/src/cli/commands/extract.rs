//! `linkcap extract`: mine every session log for download links.

use anyhow::Result;
use linkcap_core::config::LinkcapConfig;
use linkcap_core::extract::{extract_from_dir, LinkReport};
use std::path::Path;

pub fn run_extract(cfg: &LinkcapConfig, session_dir: &Path, output: &Path) -> Result<()> {
    let links = extract_from_dir(session_dir, &cfg.storage_domain)?;
    if links.is_empty() {
        println!("No download links found in {}", session_dir.display());
    }
    for link in &links {
        println!("{}  {}", link.captured_at.to_rfc3339(), shorten(&link.download_url, 100));
    }
    LinkReport::new(links).save(output)?;
    println!("Saved links to {}", output.display());
    Ok(())
}

/// Long signed URLs are cut in the middle for display.
pub(super) fn shorten(url: &str, max: usize) -> String {
    let chars: Vec<char> = url.chars().collect();
    if chars.len() <= max {
        return url.to_string();
    }
    let half = max / 2;
    let head: String = chars[..half].iter().collect();
    let tail: String = chars[chars.len() - half..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcap_core::exchange::QueryParams;
    use linkcap_core::extract::LinkRecord;

    #[test]
    fn empty_run_overwrites_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = dir.path().join("sessions");
        std::fs::create_dir(&sessions).unwrap();
        let output = dir.path().join("extracted_download_links.json");

        let stale = LinkRecord::new(
            "2025-05-28T17:40:00Z".parse().unwrap(),
            "https://api.example.com/api.php",
            "https://x.aliyundrive.net/a/b/c",
            QueryParams::new(),
            None,
        );
        LinkReport::new(vec![stale.clone(), stale]).save(&output).unwrap();

        run_extract(&LinkcapConfig::default(), &sessions, &output).unwrap();

        let report = LinkReport::load(&output).unwrap();
        assert_eq!(report.total_links, 0);
        assert!(report.links.is_empty());
    }

    #[test]
    fn shorten_keeps_both_ends() {
        let url = format!("https://x.aliyundrive.net/{}", "a".repeat(200));
        let short = shorten(&url, 20);
        assert!(short.starts_with("https://x."));
        assert!(short.ends_with("aaaaaaaaaa"));
        assert!(short.contains("..."));
        assert_eq!(shorten("https://a/b", 20), "https://a/b");
    }
}
