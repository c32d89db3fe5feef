//! Locale-aware number parsing.

use crate::config::LocaleConventions;

/// Parse a published number such as `1,234.5`, `1 234,5` or `56.7E`
///
/// Trailing footnote markers are stripped only when they follow a digit,
/// grouping separators are removed when they split the integer part into
/// groups of three and the locale decimal separator is normalized. Returns
/// `None` for anything that is not a finite number, including misplaced
/// separators such as `1,5` in English.
pub fn parse_number(text: &str, conventions: &LocaleConventions, footnotes: &[char]) -> Option<f64> {
    let mut s = text.trim();
    let stripped = s.trim_end_matches(|c: char| footnotes.contains(&c) || c.is_whitespace());
    if stripped.len() != s.len() && stripped.ends_with(|c: char| c.is_ascii_digit()) {
        s = stripped;
    }

    let mut normalized = strip_grouping(s, conventions)?;
    if conventions.decimal_separator != '.' {
        normalized = normalized.replace(conventions.decimal_separator, ".");
    }

    let well_formed = !normalized.is_empty()
        && normalized.bytes().any(|b| b.is_ascii_digit())
        && normalized
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !well_formed {
        return None;
    }

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Remove grouping separators from the integer part
fn strip_grouping(s: &str, conventions: &LocaleConventions) -> Option<String> {
    let is_group = |c: char| conventions.grouping_separators.contains(&c);
    if !s.contains(is_group) {
        return Some(s.to_string());
    }

    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let sign = &s[..s.len() - body.len()];
    let end = body
        .find(|c: char| !(c.is_ascii_digit() || is_group(c)))
        .unwrap_or(body.len());
    let (integer, rest) = body.split_at(end);
    if rest.contains(is_group) {
        return None;
    }

    let mut groups = integer.split(is_group);
    let leading = groups.next()?;
    let grouped = (1..=3).contains(&leading.len()) && groups.all(|g| g.len() == 3);
    grouped.then(|| format!("{}{}{}", sign, integer.replace(is_group, ""), rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WranglerConfig;
    use crate::models::Language;

    fn en(text: &str) -> Option<f64> {
        let config = WranglerConfig::default();
        parse_number(text, Language::English.conventions(), &config.footnote_markers)
    }

    fn fr(text: &str) -> Option<f64> {
        let config = WranglerConfig::default();
        parse_number(text, Language::French.conventions(), &config.footnote_markers)
    }

    #[test]
    fn test_english_numbers() {
        assert_eq!(en("1,234.5"), Some(1234.5));
        assert_eq!(en("2,000.0"), Some(2000.0));
        assert_eq!(en("-12"), Some(-12.0));
        assert_eq!(en(" 0.25 "), Some(0.25));
        assert_eq!(en("1.5e3"), Some(1500.0));
    }

    #[test]
    fn test_french_numbers() {
        assert_eq!(fr("1 234,5"), Some(1234.5));
        assert_eq!(fr("1\u{a0}234,5"), Some(1234.5));
        assert_eq!(fr("1\u{202f}000"), Some(1000.0));
        assert_eq!(fr("0,5"), Some(0.5));
        // Canonical output re-read under French conventions
        assert_eq!(fr("1234.5"), Some(1234.5));
    }

    #[test]
    fn test_footnote_markers() {
        assert_eq!(en("1,234E"), Some(1234.0));
        assert_eq!(en("56.7 r"), Some(56.7));
        assert_eq!(en("12p¹"), Some(12.0));
        assert_eq!(en("E"), None);
        assert_eq!(en("1E5"), Some(100000.0));
    }

    #[test]
    fn test_rejects_non_numbers() {
        assert_eq!(en("Canada"), None);
        assert_eq!(en(""), None);
        assert_eq!(en("x"), None);
        assert_eq!(en("inf"), None);
        assert_eq!(en("NaN"), None);
        assert_eq!(en("2020-01"), None);
        assert_eq!(en("1.2.3"), None);
        assert_eq!(en("1 234"), None);
    }

    #[test]
    fn test_misplaced_grouping_is_rejected() {
        assert_eq!(en("1,5"), None);
        assert_eq!(en("1,2,3"), None);
        assert_eq!(en(",123"), None);
        assert_eq!(en("1234,567"), None);
        assert_eq!(en("1.5,000"), None);
        assert_eq!(fr("1 5"), None);
        assert_eq!(en("-1,234,567.25"), Some(-1234567.25));
        assert_eq!(fr("12 345 678,9"), Some(12345678.9));
    }
}
