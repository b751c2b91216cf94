//! URL decoding for addresses scraped out of script payloads
//!
//! Payload URLs arrive JSON-escaped (`https:\/\/cdn...`) and often
//! percent-encoded. Decoding follows URI-component rules: `+` is literal and
//! a malformed escape fails the whole value.

use crate::PayloadError;

/// Turn escaped path separators (`\/`) into `/`
pub fn unescape_separators(raw: &str) -> String {
    raw.replace("\\/", "/")
}

/// Percent-decode a URI component
pub fn percent_decode_component(s: &str) -> Result<String, PayloadError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).copied().and_then(hex_value);
            let lo = bytes.get(i + 2).copied().and_then(hex_value);
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    out.push((hi << 4) | lo);
                    i += 3;
                }
                _ => return Err(PayloadError::MalformedEscape(i)),
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).map_err(|_| PayloadError::InvalidUtf8)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Require an absolute, hierarchical URL (scheme plus host)
pub fn ensure_absolute(candidate: String) -> Result<String, PayloadError> {
    match url::Url::parse(&candidate) {
        Ok(parsed) if parsed.has_host() => Ok(candidate),
        _ => Err(PayloadError::NotAbsolute(candidate)),
    }
}

/// Full decode of a pattern-matched payload URL
pub fn decode_payload_url(raw: &str) -> Result<String, PayloadError> {
    ensure_absolute(percent_decode_component(&unescape_separators(raw))?)
}
