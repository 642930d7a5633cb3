//! Shared XML attribute parsing utilities.
//!
//! These helpers keep the attribute extraction boilerplate out of the part
//! parsers. All functions handle namespace-prefixed attributes and UTF-8
//! conversion safely.

use quick_xml::events::BytesStart;

/// Extract a string attribute value by its exact (possibly prefixed) key.
///
/// Entity references in the value are unescaped. Returns `None` if the
/// attribute is missing or not valid UTF-8.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return attr.unescape_value().ok().map(|s| s.into_owned());
        }
    }
    None
}

/// Extract a string attribute by local name (ignoring namespace prefix).
///
/// `r:embed`, `embed` and `rel:embed` all match `b"embed"`.
pub fn attr_string_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            return attr.unescape_value().ok().map(|s| s.into_owned());
        }
    }
    None
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract an `i64` attribute value by key.
pub fn attr_i64(e: &BytesStart, key: &[u8]) -> Option<i64> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract an `f64` attribute value by key.
pub fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract a boolean attribute value by key.
///
/// Returns `None` if missing. Recognizes `"1"`, `"true"` as true.
pub fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.as_str(), "1" | "true"))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn make_start(xml: &str) -> BytesStart<'_> {
        // Strip < and > / /> to get just the tag content
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string_unescapes() {
        let e = make_start(r#"<cNvPr name="Logo &amp; Mark" descr="x"/>"#);
        assert_eq!(attr_string(&e, b"name"), Some("Logo & Mark".to_string()));
        assert_eq!(attr_string(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_string_local_ignores_prefix() {
        let e = make_start(r#"<a:blip r:embed="rId7"/>"#);
        assert_eq!(attr_string_local(&e, b"embed"), Some("rId7".to_string()));
        assert_eq!(attr_string(&e, b"embed"), None);
        assert_eq!(attr_string(&e, b"r:embed"), Some("rId7".to_string()));
    }

    #[test]
    fn test_numeric_attrs() {
        let e = make_start(r#"<a:ext cx="952500" cy="-5" n="12" ht="15.75"/>"#);
        assert_eq!(attr_i64(&e, b"cx"), Some(952_500));
        assert_eq!(attr_i64(&e, b"cy"), Some(-5));
        assert_eq!(attr_u32(&e, b"n"), Some(12));
        assert_eq!(attr_u32(&e, b"cy"), None);
        assert_eq!(attr_f64(&e, b"ht"), Some(15.75));
    }

    #[test]
    fn test_attr_bool() {
        let e = make_start(r#"<col a="1" b="0" c="true" d="false"/>"#);
        assert_eq!(attr_bool(&e, b"a"), Some(true));
        assert_eq!(attr_bool(&e, b"b"), Some(false));
        assert_eq!(attr_bool(&e, b"c"), Some(true));
        assert_eq!(attr_bool(&e, b"d"), Some(false));
        assert_eq!(attr_bool(&e, b"missing"), None);
    }
}
