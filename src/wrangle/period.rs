//! Reference-period parsing.
//!
//! Recognizes the period literals the agency publishes and maps each to
//! the first day of the period, except fiscal years which map to their
//! closing March 31. The resulting dates sort chronologically.

use crate::config::LocaleConventions;
use crate::models::PeriodGranularity;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]{4})$").expect("Invalid regex"));
static YEAR_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{1,2})$").expect("Invalid regex"));
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})$").expect("Invalid regex"));
static FISCAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})\s*/\s*([0-9]{4})$").expect("Invalid regex"));
static QUARTER_AFTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})\s*-?\s*(?i:([a-z]))([1-4])$").expect("Invalid regex")
});
static QUARTER_BEFORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:([a-z]))([1-4])\s+([0-9]{4})$").expect("Invalid regex"));
static MONTH_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\p{L}+)\.?\s+([0-9]{4})$").expect("Invalid regex"));

/// A reference period resolved to a calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedPeriod {
    pub date: NaiveDate,
    pub granularity: PeriodGranularity,
}

impl ParsedPeriod {
    fn new(date: NaiveDate, granularity: PeriodGranularity) -> Self {
        Self { date, granularity }
    }
}

fn number(text: &str) -> Option<u32> {
    text.parse().ok()
}

fn year(text: &str) -> Option<i32> {
    text.parse().ok()
}

fn quarter_start(year: i32, quarter: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)
}

fn is_quarter_prefix(prefix: &str, conventions: &LocaleConventions) -> bool {
    let prefix = prefix.to_lowercase();
    prefix == "q" || prefix == conventions.quarter_prefix.to_string()
}

fn month_from_name(name: &str, conventions: &LocaleConventions) -> Option<u32> {
    let name = name.to_lowercase();
    if name.chars().count() < 3 {
        return None;
    }
    conventions
        .month_names
        .iter()
        .position(|month| *month == name || month.starts_with(&name))
        .map(|index| index as u32 + 1)
}

/// Parse one period literal, `None` if it is not a recognized form
pub fn parse_period(text: &str, conventions: &LocaleConventions) -> Option<ParsedPeriod> {
    let text = text.trim();

    if let Some(caps) = YEAR_RE.captures(text) {
        let date = NaiveDate::from_ymd_opt(year(&caps[1])?, 1, 1)?;
        return Some(ParsedPeriod::new(date, PeriodGranularity::Year));
    }
    if let Some(caps) = YEAR_MONTH_RE.captures(text) {
        let date = NaiveDate::from_ymd_opt(year(&caps[1])?, number(&caps[2])?, 1)?;
        return Some(ParsedPeriod::new(date, PeriodGranularity::Month));
    }
    if let Some(caps) = DATE_RE.captures(text) {
        let date = NaiveDate::from_ymd_opt(year(&caps[1])?, number(&caps[2])?, number(&caps[3])?)?;
        return Some(ParsedPeriod::new(date, PeriodGranularity::Day));
    }
    if let Some(caps) = FISCAL_RE.captures(text) {
        let date = NaiveDate::from_ymd_opt(year(&caps[2])?, 3, 31)?;
        return Some(ParsedPeriod::new(date, PeriodGranularity::FiscalYear));
    }
    if let Some(caps) = QUARTER_AFTER_RE.captures(text) {
        if is_quarter_prefix(&caps[2], conventions) {
            let date = quarter_start(year(&caps[1])?, number(&caps[3])?)?;
            return Some(ParsedPeriod::new(date, PeriodGranularity::Quarter));
        }
        return None;
    }
    if let Some(caps) = QUARTER_BEFORE_RE.captures(text) {
        if is_quarter_prefix(&caps[1], conventions) {
            let date = quarter_start(year(&caps[3])?, number(&caps[2])?)?;
            return Some(ParsedPeriod::new(date, PeriodGranularity::Quarter));
        }
        return None;
    }
    if let Some(caps) = MONTH_NAME_RE.captures(text) {
        let month = month_from_name(&caps[1], conventions)?;
        let date = NaiveDate::from_ymd_opt(year(&caps[2])?, month, 1)?;
        return Some(ParsedPeriod::new(date, PeriodGranularity::Month));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn en(text: &str) -> Option<ParsedPeriod> {
        parse_period(text, Language::English.conventions())
    }

    fn fr(text: &str) -> Option<ParsedPeriod> {
        parse_period(text, Language::French.conventions())
    }

    #[test]
    fn test_numeric_forms() {
        assert_eq!(en("2021"), Some(ParsedPeriod::new(ymd(2021, 1, 1), PeriodGranularity::Year)));
        assert_eq!(en("2021-07"), Some(ParsedPeriod::new(ymd(2021, 7, 1), PeriodGranularity::Month)));
        assert_eq!(en("2021-07-15"), Some(ParsedPeriod::new(ymd(2021, 7, 15), PeriodGranularity::Day)));
        assert_eq!(
            en("2019/2020"),
            Some(ParsedPeriod::new(ymd(2020, 3, 31), PeriodGranularity::FiscalYear))
        );
    }

    #[test]
    fn test_quarters() {
        let q3 = Some(ParsedPeriod::new(ymd(2020, 7, 1), PeriodGranularity::Quarter));
        assert_eq!(en("2020-Q3"), q3);
        assert_eq!(en("2020Q3"), q3);
        assert_eq!(en("Q3 2020"), q3);
        assert_eq!(fr("T3 2020"), q3);
        assert_eq!(fr("2020-Q3"), q3);
        assert_eq!(en("T3 2020"), None);
        assert_eq!(en("Q5 2020"), None);
    }

    #[test]
    fn test_month_names() {
        let march = Some(ParsedPeriod::new(ymd(2022, 3, 1), PeriodGranularity::Month));
        assert_eq!(en("March 2022"), march);
        assert_eq!(en("Mar. 2022"), march);
        assert_eq!(fr("mars 2022"), march);
        assert_eq!(fr("Août 2022").map(|p| p.date), Some(ymd(2022, 8, 1)));
        assert_eq!(en("mars 2022"), None);
    }

    #[test]
    fn test_rejects_other_text() {
        assert_eq!(en("Canada"), None);
        assert_eq!(en("2020-13"), None);
        assert_eq!(en("1,234"), None);
        assert_eq!(en(""), None);
    }

    #[test]
    fn test_periods_sort_chronologically() {
        let mut dates: Vec<NaiveDate> = ["2021-Q1", "2020", "2020-06", "2019/2020"]
            .iter()
            .filter_map(|t| en(t).map(|p| p.date))
            .collect();
        dates.sort();
        assert_eq!(
            dates,
            vec![ymd(2020, 1, 1), ymd(2020, 3, 31), ymd(2020, 6, 1), ymd(2021, 1, 1)]
        );
    }
}
