//! Text canonicalization for parameter values and targets.

/// Removes every whitespace character.
pub fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Canonical comparison form of a value or literal target.
///
/// Whitespace is stripped and a trailing `.0` is dropped when what remains
/// is an integer, so `"10.0"` and `" 10 "` compare equal.
///
/// ```
/// use ratatosk_common::canonical_text;
///
/// assert_eq!(canonical_text(" 10.0 "), "10");
/// assert_eq!(canonical_text("1.05"), "1.05");
/// assert_eq!(canonical_text("a b"), "ab");
/// ```
pub fn canonical_text(value: &str) -> String {
    let stripped = strip_whitespace(value);
    if let Some(integral) = stripped.strip_suffix(".0")
        && integral.parse::<i64>().is_ok()
    {
        return integral.to_string();
    }
    stripped
}

/// Parses a string as `f64`, returning `None` for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a string as `i64`, returning `None` for invalid or empty strings.
pub fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_text_drops_integral_suffix_only() {
        assert_eq!(canonical_text("5.0"), "5");
        assert_eq!(canonical_text("-5.0"), "-5");
        assert_eq!(canonical_text("5.00"), "5.00");
        assert_eq!(canonical_text("abc.0"), "abc.0");
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_f64("  3.5  "), Some(3.5));
        assert_eq!(parse_f64("NaN"), None);
        assert_eq!(parse_f64("invalid"), None);
    }

    #[test]
    fn test_parse_i64() {
        assert_eq!(parse_i64("  -100  "), Some(-100));
        assert_eq!(parse_i64("1.5"), None);
    }
}
