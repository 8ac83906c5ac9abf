use lazy_static::lazy_static;
use regex::Regex;

/// Default cap for free-form string fields.
pub const MAX_STRING: usize = 255;

/// Trims, collapses internal whitespace runs to single spaces and truncates
/// to `max_len` characters. Empty input stays empty; callers treat an empty
/// result as "missing".
pub fn normalize_string(value: &str, max_len: usize) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_len).collect()
}

/// Lowercased, trimmed email or an empty string when the value is not
/// RFC-shaped. No partial trust: an invalid address never leaks through.
pub fn normalize_email(value: &str) -> String {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    let email = value.trim().to_lowercase();
    if EMAIL_RE.is_match(&email) {
        email
    } else {
        String::new()
    }
}

/// Coerces a raw path/query segment to a positive id. Anything that is not a
/// positive integer collapses to the 0 sentinel.
pub fn parse_positive_id(value: &str) -> i64 {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .unwrap_or(0)
}

/// Trimmed value as `Some`, or `None` when blank. Used for optional columns
/// stored as NULL.
pub fn none_if_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_string_trims_and_collapses() {
        assert_eq!(normalize_string("  Ana   B.  Cruz ", MAX_STRING), "Ana B. Cruz");
        assert_eq!(normalize_string("\tone\n two\t", MAX_STRING), "one two");
    }

    #[test]
    fn normalize_string_truncates_by_chars_not_bytes() {
        let input = "ééééé";
        assert_eq!(normalize_string(input, 3), "ééé");
    }

    #[test]
    fn normalize_string_empty_stays_empty() {
        assert_eq!(normalize_string("   ", MAX_STRING), "");
        assert_eq!(normalize_string("", MAX_STRING), "");
    }

    #[test]
    fn normalize_email_lowercases_and_trims() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }

    #[test]
    fn normalize_email_rejects_malformed() {
        assert_eq!(normalize_email("not-an-email"), "");
        assert_eq!(normalize_email("a@b"), "");
        assert_eq!(normalize_email("a b@c.com"), "");
        assert_eq!(normalize_email(""), "");
    }

    #[test]
    fn parse_positive_id_sentinel() {
        assert_eq!(parse_positive_id("42"), 42);
        assert_eq!(parse_positive_id(" 7 "), 7);
        assert_eq!(parse_positive_id("0"), 0);
        assert_eq!(parse_positive_id("-3"), 0);
        assert_eq!(parse_positive_id("abc"), 0);
        assert_eq!(parse_positive_id("12abc"), 0);
    }

    #[test]
    fn none_if_blank_maps_empty_to_none() {
        assert_eq!(none_if_blank("  "), None);
        assert_eq!(none_if_blank(" x "), Some("x".to_string()));
    }
}
