//! Configuration management.
//!
//! Provides the client configuration (remote locations, timeouts), the
//! per-language formatting conventions table, and the wrangling rule set
//! (sentinel tokens, footnote markers, structural column names). The rule
//! set is data so upstream format drift can be absorbed without code
//! changes.

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_CATALOG_URL, DEFAULT_TIMEOUT_SECS, ENV_BASE_URL, ENV_CATALOG_URL,
    ENV_TIMEOUT_SECS, USER_AGENT,
};
use crate::error::{Result, StatCanError};
use crate::models::{Language, SentinelKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Client-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatCanConfig {
    /// Catalog feed location
    pub catalog_url: String,

    /// Host serving the table archives
    pub base_url: String,

    /// Transport timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Wrangling rule set
    pub wrangler: WranglerConfig,
}

impl Default for StatCanConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: USER_AGENT.to_string(),
            wrangler: WranglerConfig::default(),
        }
    }
}

impl StatCanConfig {
    /// Defaults overlaid with `STATCAN_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENV_CATALOG_URL) {
            debug!("Catalog URL overridden by {}", ENV_CATALOG_URL);
            config.catalog_url = url;
        }
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            debug!("Base URL overridden by {}", ENV_BASE_URL);
            config.base_url = url;
        }
        if let Ok(secs) = std::env::var(ENV_TIMEOUT_SECS) {
            config.timeout_secs = secs.trim().parse().map_err(|_| StatCanError::Configuration {
                message: format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECS, secs),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_wrangler(mut self, wrangler: WranglerConfig) -> Self {
        self.wrangler = wrangler;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(StatCanError::Configuration {
                message: "timeout must be greater than zero".to_string(),
            });
        }
        for (name, url) in [("catalog_url", &self.catalog_url), ("base_url", &self.base_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(StatCanError::Configuration {
                    message: format!("{} must be an http(s) URL, got '{}'", name, url),
                });
            }
        }
        Ok(())
    }
}

/// Number, period and URL conventions of one language
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocaleConventions {
    pub language: Language,
    pub decimal_separator: char,
    pub grouping_separators: &'static [char],
    /// Letter before the quarter number (Q1 2020, T1 2020)
    pub quarter_prefix: char,
    pub month_names: [&'static str; 12],
    /// Language tag in archive file names ({pid}-eng.zip)
    pub archive_suffix: &'static str,
}

const ENGLISH: LocaleConventions = LocaleConventions {
    language: Language::English,
    decimal_separator: '.',
    grouping_separators: &[','],
    quarter_prefix: 'q',
    month_names: [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ],
    archive_suffix: "eng",
};

const FRENCH: LocaleConventions = LocaleConventions {
    language: Language::French,
    decimal_separator: ',',
    grouping_separators: &[' ', '\u{a0}', '\u{202f}'],
    quarter_prefix: 't',
    month_names: [
        "janvier",
        "février",
        "mars",
        "avril",
        "mai",
        "juin",
        "juillet",
        "août",
        "septembre",
        "octobre",
        "novembre",
        "décembre",
    ],
    archive_suffix: "fra",
};

impl LocaleConventions {
    pub fn for_language(language: Language) -> &'static LocaleConventions {
        match language {
            Language::English => &ENGLISH,
            Language::French => &FRENCH,
        }
    }
}

impl Language {
    pub fn conventions(&self) -> &'static LocaleConventions {
        LocaleConventions::for_language(*self)
    }
}

/// Agency placeholder token and what it stands for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelToken {
    pub token: String,
    pub kind: SentinelKind,
}

impl SentinelToken {
    fn new(token: &str, kind: SentinelKind) -> Self {
        Self {
            token: token.to_string(),
            kind,
        }
    }
}

/// Rules applied by the table wrangler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WranglerConfig {
    /// Placeholder tokens, matched exactly after trimming
    pub sentinels: Vec<SentinelToken>,

    /// Trailing annotation characters stripped from numbers (1,234E, 56.7r)
    pub footnote_markers: Vec<char>,

    /// Headers naming the reference-period column in long tables
    pub period_columns: Vec<String>,

    /// Headers naming the value column in long tables
    pub value_columns: Vec<String>,

    /// Headers that are always kept as text
    pub text_columns: Vec<String>,
}

impl Default for WranglerConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            sentinels: vec![
                SentinelToken::new("x", SentinelKind::Suppressed),
                SentinelToken::new("X", SentinelKind::Suppressed),
                SentinelToken::new("F", SentinelKind::Suppressed),
                SentinelToken::new("..", SentinelKind::NotAvailable),
                SentinelToken::new("...", SentinelKind::NotApplicable),
                SentinelToken::new("conf", SentinelKind::Confidential),
            ],
            footnote_markers: vec![
                'A', 'B', 'C', 'D', 'E', 'r', 'p', '*', '†', '‡', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷',
                '⁸', '⁹', '⁰',
            ],
            period_columns: strings(&[
                "REF_DATE",
                "Reference period",
                "PÉRIODE DE RÉFÉRENCE",
                "Période de référence",
            ]),
            value_columns: strings(&["VALUE", "VALEUR"]),
            text_columns: strings(&[
                "COORDINATE",
                "COORDONNÉES",
                "VECTOR",
                "VECTEUR",
                "DGUID",
                "INDICATOR",
                "REF_PERIOD",
            ]),
        }
    }
}

impl WranglerConfig {
    /// Sentinel meaning of a trimmed cell, if it is a placeholder
    pub fn sentinel(&self, cell: &str) -> Option<SentinelKind> {
        let cell = cell.trim();
        self.sentinels
            .iter()
            .find(|s| s.token == cell)
            .map(|s| s.kind)
    }

    pub fn is_period_column(&self, header: &str) -> bool {
        matches_any(&self.period_columns, header)
    }

    pub fn is_value_column(&self, header: &str) -> bool {
        matches_any(&self.value_columns, header)
    }

    pub fn is_text_column(&self, header: &str) -> bool {
        matches_any(&self.text_columns, header)
    }

    pub fn with_sentinel(mut self, token: impl Into<String>, kind: SentinelKind) -> Self {
        self.sentinels.push(SentinelToken {
            token: token.into(),
            kind,
        });
        self
    }
}

fn matches_any(names: &[String], header: &str) -> bool {
    let header = header.trim().to_lowercase();
    names.iter().any(|name| name.to_lowercase() == header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StatCanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_invalid_urls_rejected() {
        let config = StatCanConfig::default().with_base_url("ftp://example.com");
        assert!(matches!(
            config.validate(),
            Err(StatCanError::Configuration { .. })
        ));

        let config = StatCanConfig::default().with_timeout_secs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_locale_table() {
        let en = Language::English.conventions();
        let fr = Language::French.conventions();
        assert_eq!(en.decimal_separator, '.');
        assert_eq!(fr.decimal_separator, ',');
        assert_eq!(en.archive_suffix, "eng");
        assert_eq!(fr.archive_suffix, "fra");
        assert_eq!(fr.month_names[7], "août");
    }

    #[test]
    fn test_sentinel_lookup() {
        let config = WranglerConfig::default();
        assert_eq!(config.sentinel(" x "), Some(SentinelKind::Suppressed));
        assert_eq!(config.sentinel(".."), Some(SentinelKind::NotAvailable));
        assert_eq!(config.sentinel("..."), Some(SentinelKind::NotApplicable));
        assert_eq!(config.sentinel("12"), None);

        let config = config.with_sentinel("s", SentinelKind::Confidential);
        assert_eq!(config.sentinel("s"), Some(SentinelKind::Confidential));
    }

    #[test]
    fn test_structural_column_names_are_case_insensitive() {
        let config = WranglerConfig::default();
        assert!(config.is_period_column("ref_date"));
        assert!(config.is_period_column("Période de référence"));
        assert!(config.is_value_column(" Valeur "));
        assert!(config.is_text_column("Coordinate"));
        assert!(!config.is_value_column("GEO"));
    }
}
