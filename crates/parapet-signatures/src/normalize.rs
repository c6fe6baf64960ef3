//! Payload normalization
//!
//! Turns query parameters, form fields, and raw bodies into one canonical
//! string for signature matching: `key=value` pairs joined by spaces,
//! lowercased, then percent-decoded.
//!
//! Normalization never fails. Malformed percent-escapes are left literal and
//! invalid UTF-8 degrades to replacement characters; a hostile body must not
//! be able to error its way past inspection.

use std::borrow::Cow;

/// Normalize a key-value mapping (query parameters or form fields).
///
/// Pairs are joined as `key=value`, space-separated, in mapping order, then
/// lowercased and percent-decoded. Empty input produces the empty string.
///
/// # Example
///
/// ```rust
/// use parapet_signatures::normalize_pairs;
///
/// let pairs = vec![
///     ("User".to_string(), "Bob".to_string()),
///     ("q".to_string(), "%27%20OR%20%271%27%3D%271".to_string()),
/// ];
/// assert_eq!(normalize_pairs(&pairs), "user=bob q=' or '1'='1");
/// ```
#[must_use]
pub fn normalize_pairs(pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return String::new();
    }
    let joined = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");
    decode_lossy(&joined.to_lowercase())
}

/// Normalize a raw payload string (query string tail, raw POST body).
///
/// Lowercases, then percent-decodes best-effort. Empty input produces the
/// empty string.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    decode_lossy(&raw.to_lowercase())
}

/// Percent-decode without ever failing.
///
/// `decode_binary` leaves invalid escape sequences untouched; invalid UTF-8
/// in the decoded bytes becomes U+FFFD.
fn decode_lossy(s: &str) -> String {
    match urlencoding::decode_binary(s.as_bytes()) {
        Cow::Borrowed(b) => String::from_utf8_lossy(b).into_owned(),
        Cow::Owned(b) => match String::from_utf8(b) {
            Ok(decoded) => decoded,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs() {
        assert_eq!(normalize_pairs(&[]), "");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_pairs_joined_in_order() {
        let pairs = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ];
        assert_eq!(normalize_pairs(&pairs), "a=1 b=2");
    }

    #[test]
    fn test_lowercasing() {
        assert_eq!(normalize_text("SELECT * FROM Users"), "select * from users");
        let pairs = vec![("Name".to_string(), "O'Brien".to_string())];
        assert_eq!(normalize_pairs(&pairs), "name=o'brien");
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(normalize_text("%3Cscript%3E"), "<script>");
        assert_eq!(normalize_text("1%27%20or%20%271%27%3D%271"), "1' or '1'='1");
    }

    #[test]
    fn test_invalid_escape_left_literal() {
        assert_eq!(normalize_text("100%zz"), "100%zz");
        assert_eq!(normalize_text("trailing%"), "trailing%");
        assert_eq!(normalize_text("short%2"), "short%2");
    }

    #[test]
    fn test_invalid_utf8_degrades() {
        // %ff alone is not valid UTF-8; must degrade, not fail.
        let out = normalize_text("a%ffb");
        assert!(out.starts_with('a'));
        assert!(out.ends_with('b'));
        assert!(out.contains('\u{fffd}'));
    }

    #[test]
    fn test_lowercase_happens_before_decode() {
        // %41 decodes to 'A' only after the escape itself was lowercased to
        // %41 -> the decoded byte keeps its case.
        assert_eq!(normalize_text("%41BC"), "Abc");
    }

    #[test]
    fn test_plus_is_not_space() {
        // Only percent-escapes are decoded; '+' stays literal, matching the
        // query-string form the transport hands over.
        assert_eq!(normalize_text("a+b"), "a+b");
    }
}
