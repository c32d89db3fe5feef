//! Command-line argument definitions for the statcan tool
//!
//! Global flags control logging, the dataframe backend and how many rows
//! are printed; each subcommand carries its own options.

use crate::frame::Backend;
use crate::models::Language;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Search the Statistics Canada catalog and download cleaned tables
#[derive(Debug, Clone, Parser)]
#[command(
    name = "statcan",
    version,
    about = "Search the Statistics Canada catalog and download cleaned tables",
    long_about = "Searches the published Statistics Canada table catalog by keyword and downloads \
                  full tables as cleaned, typed data: sentinel placeholders become missing values, \
                  wide tables are pivoted to long form and reference periods become dates."
)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct GlobalArgs {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors and hide the progress spinner
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Build results as a polars DataFrame instead of the native table
    #[arg(long = "polars", global = true)]
    pub polars: bool,

    /// Number of rows to print, 0 prints only the header
    #[arg(long = "return-rows", value_name = "N", global = true)]
    pub return_rows: Option<usize>,

    /// How results are printed
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Human, global = true)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Search the catalog; every keyword must match
    Search(SearchArgs),
    /// Download, clean and optionally save one table
    Download(DownloadArgs),
}

#[derive(Debug, Clone, ClapArgs)]
pub struct SearchArgs {
    /// Keywords matched against title and description (none lists everything)
    #[arg(value_name = "KEYWORDS")]
    pub keywords: Vec<String>,

    /// Restrict results to one catalog language (en or fr)
    #[arg(short = 'l', long = "language", value_parser = parse_language)]
    pub language: Option<Language>,

    /// Alternative catalog feed
    #[arg(long = "catalog-url", value_name = "URL")]
    pub catalog_url: Option<String>,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct DownloadArgs {
    /// Table number in NN-NN-NNNN-NN form, e.g. 34-10-0281-01
    #[arg(value_name = "TABLE_NUMBER")]
    pub table_number: String,

    /// Language of the downloaded table (en or fr)
    #[arg(short = 'l', long = "language", value_parser = parse_language, default_value = "en")]
    pub language: Language,

    /// Directory to save the cleaned CSV into
    #[arg(short = 's', long = "save-dir", value_name = "DIR")]
    pub save_dir: Option<PathBuf>,

    /// Alternative archive host
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,
}

/// Result printing style
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table with a heading
    Human,
    /// JSON object with columns and rows
    Json,
}

fn parse_language(value: &str) -> std::result::Result<Language, String> {
    value.parse::<Language>().map_err(|e| e.to_string())
}

impl GlobalArgs {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    pub fn backend(&self) -> Backend {
        if self.polars {
            Backend::Polars
        } else {
            Backend::Native
        }
    }
}
