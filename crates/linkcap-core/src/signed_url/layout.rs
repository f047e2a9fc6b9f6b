//! Host and path structure of a signed download URL.

use serde::Serialize;

use crate::url_model::percent_decode;

const EXPECTED_SEGMENTS: usize = 3;
const REGION_PREFIX: &str = "cn-";
const REGION_SUFFIX: &str = "-data";

/// bucket / owner / object, plus anything after the third segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathLayout {
    pub bucket: Option<String>,
    pub owner: Option<String>,
    pub object: Option<String>,
    /// Segments beyond the expected three; reported, never interpreted.
    pub extra: Vec<String>,
}

impl PathLayout {
    pub(super) fn from_segments(segments: &[String]) -> Self {
        let mut iter = segments.iter().cloned();
        Self {
            bucket: iter.next(),
            owner: iter.next(),
            object: iter.next(),
            extra: iter.collect(),
        }
    }

    pub(super) fn is_complete(segments: &[String]) -> bool {
        segments.len() == EXPECTED_SEGMENTS
    }
}

/// Splits the raw path on `/`, decodes each segment on its own, and expands
/// segments whose decoded form is itself a path (`a%2Fb` → `a`, `b`).
pub(super) fn decode_path_segments(raw_segments: Option<std::str::Split<'_, char>>) -> Vec<String> {
    let Some(raw_segments) = raw_segments else {
        return Vec::new();
    };
    raw_segments
        .filter(|s| !s.is_empty())
        .flat_map(|raw| {
            percent_decode(raw)
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// True when `host` is `domain` or a subdomain of it.
pub(super) fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// `cn-beijing-data.<domain>` → `beijing`. `None` when the host has no label
/// in front of the domain.
pub(super) fn region_from_host(host: &str, domain: &str) -> Option<String> {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    let sub = host.strip_suffix(&domain)?.strip_suffix('.')?;
    let first = sub.split('.').next().filter(|l| !l.is_empty())?;
    let region = first.strip_prefix(REGION_PREFIX).unwrap_or(first);
    let region = region.strip_suffix(REGION_SUFFIX).unwrap_or(region);
    (!region.is_empty()).then(|| region.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_strips_prefix_and_suffix() {
        assert_eq!(
            region_from_host("cn-beijing-data.aliyundrive.net", "aliyundrive.net").as_deref(),
            Some("beijing")
        );
        assert_eq!(region_from_host("x.aliyundrive.net", "aliyundrive.net").as_deref(), Some("x"));
        assert_eq!(region_from_host("aliyundrive.net", "aliyundrive.net"), None);
        assert_eq!(region_from_host("example.com", "aliyundrive.net"), None);
    }

    #[test]
    fn root_dot_host_keeps_region() {
        assert!(host_matches("cn-beijing-data.aliyundrive.net.", "aliyundrive.net"));
        assert_eq!(
            region_from_host("cn-beijing-data.aliyundrive.net.", "aliyundrive.net").as_deref(),
            Some("beijing")
        );
    }

    #[test]
    fn host_suffix_needs_label_boundary() {
        assert!(host_matches("cn-beijing-data.aliyundrive.net", "aliyundrive.net"));
        assert!(host_matches("aliyundrive.net", "aliyundrive.net"));
        assert!(!host_matches("evilaliyundrive.net", "aliyundrive.net"));
        assert!(!host_matches("aliyundrive.net.example.com", "aliyundrive.net"));
    }

    #[test]
    fn encoded_slashes_expand_into_segments() {
        let segs = decode_path_segments(Some("a%2Fb%2Fc".split('/')));
        assert_eq!(segs, vec!["a", "b", "c"]);
        let segs = decode_path_segments(Some("x//y%20z/".split('/')));
        assert_eq!(segs, vec!["x", "y z"]);
    }

    #[test]
    fn layout_reports_extra_segments() {
        let segs: Vec<String> = ["b", "o", "h1", "h2"].iter().map(|s| s.to_string()).collect();
        let layout = PathLayout::from_segments(&segs);
        assert_eq!(layout.bucket.as_deref(), Some("b"));
        assert_eq!(layout.object.as_deref(), Some("h1"));
        assert_eq!(layout.extra, vec!["h2"]);
        assert!(!PathLayout::is_complete(&segs));
    }
}
