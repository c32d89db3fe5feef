//! Statistics Canada catalog search and table downloads
//!
//! This library provides tools for:
//! - Loading the published table catalog and searching it by keyword,
//!   per language or across both
//! - Downloading full-table archives by table number
//! - Wrangling the agency's CSV payloads into typed long-form tables
//!   (sentinels to missing values, wide to long, periods to dates)
//! - Handing results over as a native table or a polars `DataFrame`

pub mod catalog;
pub mod client;
pub mod config;
pub mod constants;
pub mod delimited;
pub mod error;
pub mod fetcher;
pub mod frame;
pub mod metadata;
pub mod models;
pub mod transport;
pub mod wrangle;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use client::{Download, StatCan};
pub use config::{LocaleConventions, StatCanConfig, WranglerConfig};
pub use error::{Result, StatCanError};
pub use frame::{Backend, DataframeHandle, to_dataframe};
pub use metadata::MetadataDatabase;
pub use models::{Cell, CatalogEntry, Language, RawTable, SentinelKind, Table, WrangledTable};
pub use wrangle::{Wrangler, wrangle};
