use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LinkRecord;
use crate::exchange::deserialize_timestamp;
use crate::store::write_json_atomic;

/// The result file of one extraction or verification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkReport {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub extracted_time: DateTime<Utc>,
    pub total_links: usize,
    pub links: Vec<LinkRecord>,
}

impl LinkReport {
    pub fn new(links: Vec<LinkRecord>) -> Self {
        Self {
            extracted_time: Utc::now(),
            total_links: links.len(),
            links,
        }
    }

    /// Overwrites `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(self, path)
            .with_context(|| format!("write link report: {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open link report: {}", path.display()))?;
        let mut report: LinkReport = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("parse link report: {}", path.display()))?;
        if report.total_links != report.links.len() {
            tracing::warn!(
                path = %path.display(),
                declared = report.total_links,
                actual = report.links.len(),
                "link report count mismatch"
            );
            report.total_links = report.links.len();
        }
        Ok(report)
    }
}
