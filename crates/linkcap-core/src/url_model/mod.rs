//! Filename and percent-decoding helpers shared by the decomposer and the prober.

mod content_disposition;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use sanitize::sanitize_filename;

/// Filename carried by a Content-Disposition value, sanitized.
/// `None` when the value names no usable file.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    parse_content_disposition_filename(value)
        .map(|raw| sanitize_filename(&raw))
        .filter(|s| !s.is_empty())
}

/// Percent-decodes `input`; malformed escapes are kept verbatim and invalid
/// UTF-8 is replaced. `+` is left alone (this is not form decoding).
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
