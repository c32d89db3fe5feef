//! Application constants for the statcan client
//!
//! URLs, column names, default values and agency tokens used throughout
//! the library. Values that callers may want to change at runtime live in
//! [`crate::config`] instead.

// =============================================================================
// Remote locations
// =============================================================================

/// Published catalog feed (title, id, description, release_date, lang)
pub const DEFAULT_CATALOG_URL: &str = "https://gist.githubusercontent.com/aalekhpatel07/5a6ac4537d9b38965ebc0c2482f82d55/raw/e92efb28aecf28d0c0fae4f95058b8ad14948e4d/statcan_data.csv";

/// Host serving the full-table CSV archives
pub const DEFAULT_BASE_URL: &str = "https://www150.statcan.gc.ca";

/// Full-table archives can be hundreds of megabytes
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub const USER_AGENT: &str = concat!("statcan-rs/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Environment variables
// =============================================================================

pub const ENV_CATALOG_URL: &str = "STATCAN_CATALOG_URL";
pub const ENV_BASE_URL: &str = "STATCAN_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "STATCAN_TIMEOUT_SECS";

// =============================================================================
// Identifiers and archive layout
// =============================================================================

/// Hyphenated table number, e.g. 34-10-0281-01
pub const TABLE_NUMBER_PATTERN: &str = r"^\d{2}-\d{2}-\d{4}-\d{2}$";

/// Suffix of the metadata companion file inside each archive
pub const METADATA_FILE_SUFFIX: &str = "_metadata.csv";

/// Delimiters tried, in order of preference, when sniffing a CSV header
pub const CANDIDATE_DELIMITERS: &[u8] = b",;\t";

// =============================================================================
// Normalized output schema
// =============================================================================

pub mod columns {
    /// Normalized reference-period column
    pub const REF_DATE: &str = "REF_DATE";

    /// Normalized value column
    pub const VALUE: &str = "VALUE";

    /// Dataset title appended as a dimension when known
    pub const INDICATOR: &str = "INDICATOR";

    /// Period kind, added when every reference period is a fiscal year
    pub const REF_PERIOD: &str = "REF_PERIOD";

    /// `REF_PERIOD` label for fiscal years
    pub const FISCAL_YEAR: &str = "Fiscal year";

    /// Columns of a catalog search result, in order
    pub const CATALOG: &[&str] = &["title", "id", "description", "release_date", "lang"];
}

// =============================================================================
// Output
// =============================================================================

/// Rows shown by `head()` when no count is given
pub const DEFAULT_HEAD_ROWS: usize = 5;

/// Prefix of saved CSV file names (statcan_{pid}_{lang}.csv)
pub const SAVE_FILE_PREFIX: &str = "statcan";
