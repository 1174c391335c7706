//! Response body decoding
//!
//! Many municipal boards still serve EUC-KR/CP949 and declare it only in a
//! `<meta>` tag, if at all. The encoding is taken from the `Content-Type`
//! charset, then from a `<meta>` declaration near the top of the document,
//! then from statistical detection.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;

/// How far into the body a `<meta>` declaration is looked for
const META_SNIFF_BYTES: usize = 4096;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]*charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#).expect("static regex")
});

/// Decodes a response body to text
///
/// # Example
///
/// ```
/// use bulletin_harvest::crawler::decode_body;
///
/// let (bytes, _, _) = encoding_rs::EUC_KR.encode("해미면");
/// assert_eq!(decode_body(&bytes, Some("text/html; charset=euc-kr")), "해미면");
/// ```
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(bytes))
        .unwrap_or_else(|| detect_encoding(bytes));

    // A BOM overrides the chosen encoding
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = used.name(), "Body had undecodable bytes");
    }
    text.into_owned()
}

/// Encoding named by the `charset` parameter of a `Content-Type` value
pub fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Encoding::for_label(value.trim().trim_matches(|c| c == '"' || c == '\'').as_bytes())
    })
}

/// Encoding declared by a `<meta charset>` or `<meta http-equiv>` tag
pub fn charset_from_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_BYTES)];
    // Labels are ASCII, so a lossy view of the head is enough to find them
    let head = String::from_utf8_lossy(head);
    let label = META_CHARSET.captures(&head)?.get(1)?.as_str();

    // A UTF-16 label in an ASCII-readable head means UTF-8
    Encoding::for_label(label.as_bytes()).map(|e| e.output_encoding())
}

fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(Some(b"kr".as_slice()), true)
}
