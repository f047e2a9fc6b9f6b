//! Parse HEAD response header lines.

/// Headers of the final response that the prober cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadHeaders {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

/// Parse collected header lines. When redirects were followed the lines of
/// every hop are present; only the block after the last status line counts.
pub(crate) fn parse_headers(lines: &[String]) -> HeadHeaders {
    let start = lines
        .iter()
        .rposition(|l| l.starts_with("HTTP/"))
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut out = HeadHeaders::default();
    for line in &lines[start..] {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.parse::<u64>() {
                    out.content_length = Some(n);
                }
            }
            if name.eq_ignore_ascii_case("content-type") && !value.is_empty() {
                out.content_type = Some(value.to_string());
            }
            if name.eq_ignore_ascii_case("content-disposition") && !value.is_empty() {
                out.content_disposition = Some(value.to_string());
            }
        }
    }
    out
}
