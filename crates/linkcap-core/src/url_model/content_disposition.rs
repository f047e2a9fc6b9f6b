//! Content-Disposition parsing (filename and filename*).

use super::percent_decode;

/// Extracts the filename from a Content-Disposition value.
///
/// Supports:
/// - `filename="value"` (quoted; backslash escapes removed)
/// - `filename=value` (token)
/// - `filename*=UTF-8''percent-encoded` (RFC 5987; charset matched case-insensitively)
///
/// `filename*` wins over `filename` when both are present. A plain `filename`
/// that still carries percent escapes is decoded too, which is how signed
/// download URLs usually spell it.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut plain: Option<String> = None;

    for param in header_value.split(';') {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();

        match name.as_str() {
            "filename*" => {
                if let Some(decoded) = decode_ext_value(value) {
                    return Some(decoded);
                }
            }
            "filename" => {
                let unquoted = unquote(value);
                let decoded = if unquoted.contains('%') {
                    percent_decode(&unquoted)
                } else {
                    unquoted
                };
                if !decoded.is_empty() {
                    plain = Some(decoded);
                }
            }
            _ => {}
        }
    }

    plain
}

/// `charset'lang'value` → decoded value. Only UTF-8 (and its ASCII subset) is accepted.
fn decode_ext_value(value: &str) -> Option<String> {
    let value = unquote(value);
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?.to_ascii_lowercase();
    let _lang = parts.next()?;
    let encoded = parts.next()?;
    if charset != "utf-8" && charset != "us-ascii" {
        return None;
    }
    let decoded = percent_decode(encoded);
    (!decoded.is_empty()).then_some(decoded)
}

fn unquote(v: &str) -> String {
    let inner = match v.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner,
        None => return v.trim_matches('\'').to_string(),
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}
