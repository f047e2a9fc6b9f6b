use std::fmt;

use serde::Serialize;

use crate::extract::{LinkRecord, LinkStatus};

/// Per-status counts over a verified link set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifySummary {
    pub total: usize,
    pub unchecked: usize,
    pub valid: usize,
    pub expired: usize,
    pub not_found: usize,
    pub indeterminate: usize,
    /// Expired links that a fresh record replaced.
    pub refreshed: usize,
    /// Expired links left without a replacement; their source must be recaptured.
    pub needs_recapture: usize,
}

impl VerifySummary {
    pub fn from_links(links: &[LinkRecord]) -> Self {
        let mut s = Self {
            total: links.len(),
            ..Default::default()
        };
        for link in links {
            match link.status {
                LinkStatus::Unchecked => s.unchecked += 1,
                LinkStatus::Valid => s.valid += 1,
                LinkStatus::Expired => {
                    s.expired += 1;
                    if link.superseded_by.is_some() {
                        s.refreshed += 1;
                    } else {
                        s.needs_recapture += 1;
                    }
                }
                LinkStatus::NotFound => s.not_found += 1,
                LinkStatus::Indeterminate => s.indeterminate += 1,
            }
        }
        s
    }
}

impl fmt::Display for VerifySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} links: {} valid, {} expired ({} refreshed, {} need recapture), {} not found, {} indeterminate, {} unchecked",
            self.total,
            self.valid,
            self.expired,
            self.refreshed,
            self.needs_recapture,
            self.not_found,
            self.indeterminate,
            self.unchecked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::QueryParams;
    use chrono::Utc;

    fn link(status: LinkStatus, superseded: bool) -> LinkRecord {
        let mut l = LinkRecord::new(Utc::now(), "s", "https://x.aliyundrive.net/a", QueryParams::new(), None);
        l.status = status;
        if superseded {
            l.superseded_by = Some("https://y.aliyundrive.net/b".into());
        }
        l
    }

    #[test]
    fn counts_by_status() {
        let links = vec![
            link(LinkStatus::Valid, false),
            link(LinkStatus::Expired, true),
            link(LinkStatus::Valid, false),
            link(LinkStatus::Expired, false),
            link(LinkStatus::Indeterminate, false),
        ];
        let s = VerifySummary::from_links(&links);
        assert_eq!(s.total, 5);
        assert_eq!(s.valid, 2);
        assert_eq!(s.expired, 2);
        assert_eq!(s.refreshed, 1);
        assert_eq!(s.needs_recapture, 1);
        assert_eq!(s.indeterminate, 1);
        assert!(s.to_string().starts_with("5 links: 2 valid"));
    }
}
