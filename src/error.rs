//! Error handling for catalog search and table downloads.
//!
//! Every failure the library can report is a variant of [`StatCanError`].
//! Errors are returned to the immediate caller and never retried or
//! recovered internally.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatCanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "polars")]
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Source unavailable: {url} - {reason}")]
    SourceUnavailable { url: String, reason: String },

    #[error("Malformed catalog: {reason}")]
    MalformedCatalog { reason: String },

    #[error("Malformed archive for table {table_number}: {reason}")]
    MalformedArchive {
        table_number: String,
        reason: String,
    },

    #[error("Invalid table number '{value}': expected the NN-NN-NNNN-NN format")]
    InvalidIdentifier { value: String },

    #[error("Dataset not found: {table_number} ({url})")]
    DatasetNotFound { table_number: String, url: String },

    #[error("Wrangling failed in column '{column}' at row {row}: {reason} (value: '{value}')")]
    Wrangling {
        column: String,
        row: usize,
        value: String,
        reason: String,
    },

    #[error("Unsupported locale: '{locale}' (expected en or fr)")]
    UnsupportedLocale { locale: String },

    #[error("Dataframe backend '{backend}' is not available: {hint}")]
    BackendUnavailable { backend: String, hint: String },

    #[error("Metadata database has not been loaded; call load() first")]
    NotLoaded,

    #[error("Could not save table to {path}: {reason}")]
    SaveFailed { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl StatCanError {
    /// Short machine-friendly name of the error kind, printed by the CLI
    /// in front of the message
    pub fn kind(&self) -> &'static str {
        match self {
            StatCanError::Io(_) => "Io",
            #[cfg(feature = "polars")]
            StatCanError::Polars(_) => "Polars",
            StatCanError::SourceUnavailable { .. } => "SourceUnavailable",
            StatCanError::MalformedCatalog { .. } => "MalformedCatalog",
            StatCanError::MalformedArchive { .. } => "MalformedArchive",
            StatCanError::InvalidIdentifier { .. } => "InvalidIdentifier",
            StatCanError::DatasetNotFound { .. } => "DatasetNotFound",
            StatCanError::Wrangling { .. } => "WranglingError",
            StatCanError::UnsupportedLocale { .. } => "UnsupportedLocale",
            StatCanError::BackendUnavailable { .. } => "BackendUnavailable",
            StatCanError::NotLoaded => "NotLoaded",
            StatCanError::SaveFailed { .. } => "SaveFailed",
            StatCanError::Configuration { .. } => "Configuration",
        }
    }
}

pub type Result<T> = std::result::Result<T, StatCanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_names() {
        assert_eq!(StatCanError::NotLoaded.kind(), "NotLoaded");
        let err = StatCanError::Wrangling {
            column: "VALUE".to_string(),
            row: 3,
            value: "abc".to_string(),
            reason: "not a number".to_string(),
        };
        assert_eq!(err.kind(), "WranglingError");
        assert!(err.to_string().contains("'VALUE' at row 3"));
    }

    #[test]
    fn test_invalid_identifier_message() {
        let err = StatCanError::InvalidIdentifier {
            value: "1234".to_string(),
        };
        assert!(err.to_string().contains("NN-NN-NNNN-NN"));
    }
}
