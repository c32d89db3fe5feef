//! Core data structures shared by the catalog, fetcher, wrangler and facade.
//!
//! Defines the language selector, catalog entries, the untyped raw table
//! handed over by the fetcher and the typed tables produced by wrangling.

use crate::constants::columns;
use crate::error::{Result, StatCanError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Catalog and formatting locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    English,
    French,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::French];

    /// Two-letter code used in URLs and the catalog `lang` column
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = StatCanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "eng" | "english" => Ok(Language::English),
            "fr" | "fra" | "fre" | "french" | "français" | "francais" => Ok(Language::French),
            _ => Err(StatCanError::UnsupportedLocale {
                locale: s.to_string(),
            }),
        }
    }
}

/// One dataset listing in one locale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub release_date: Option<String>,
    pub language: Language,
}

/// Extracted tabular payload before any typing
///
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Dataset title, when the source provides one
    pub name: Option<String>,
}

impl RawTable {
    /// Build a raw table, padding short rows with empty cells
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        Self {
            columns,
            rows,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column, matched case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// Cell by row position and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(index)).map(|s| s.as_str())
    }

    /// All cells of one column, by position
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[index].as_str())
    }
}

/// Agency placeholder meaning "there is no publishable number here"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentinelKind {
    Suppressed,
    NotAvailable,
    NotApplicable,
    Confidential,
}

/// Resolution of a parsed reference period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodGranularity {
    Year,
    FiscalYear,
    Quarter,
    Month,
    Day,
}

/// A single typed value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Cell {
    /// Canonical text form: plain decimal numbers, ISO dates, empty for missing
    pub fn to_text(&self) -> String {
        match self {
            Cell::Missing => String::new(),
            Cell::Number(v) => v.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => f.write_str("null"),
            other => f.write_str(&other.to_text()),
        }
    }
}

/// Typed column storage
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Number(Vec<Option<f64>>),
    Date(Vec<Option<NaiveDate>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Number(v) => v.len(),
            ColumnData::Date(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cell(&self, row: usize) -> Cell {
        match self {
            ColumnData::Number(v) => v.get(row).copied().flatten().map_or(Cell::Missing, Cell::Number),
            ColumnData::Date(v) => v.get(row).copied().flatten().map_or(Cell::Missing, Cell::Date),
            ColumnData::Text(v) => v
                .get(row)
                .cloned()
                .flatten()
                .map_or(Cell::Missing, Cell::Text),
        }
    }

    /// Keep only the rows listed in `rows`, in that order
    pub fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Number(v) => ColumnData::Number(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Date(v) => ColumnData::Date(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    pub fn head(&self, n: usize) -> ColumnData {
        let n = n.min(self.len());
        match self {
            ColumnData::Number(v) => ColumnData::Number(v[..n].to_vec()),
            ColumnData::Date(v) => ColumnData::Date(v[..n].to_vec()),
            ColumnData::Text(v) => ColumnData::Text(v[..n].to_vec()),
        }
    }
}

/// Named typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Ordered collection of equal-length typed columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        debug_assert!(
            columns.windows(2).all(|w| w[0].data.len() == w[1].data.len()),
            "table columns must have equal length"
        );
        Self { columns }
    }

    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<Cell> {
        self.column(column).map(|c| c.data.cell(row))
    }

    pub fn head(&self, n: usize) -> Table {
        Table::new(
            self.columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.head(n)))
                .collect(),
        )
    }

    pub fn take(&self, rows: &[usize]) -> Table {
        Table::new(
            self.columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.take(rows)))
                .collect(),
        )
    }

    /// Render every cell back to canonical text
    pub fn to_raw(&self) -> RawTable {
        let columns = self.columns.iter().map(|c| c.name.clone()).collect();
        let rows = (0..self.height())
            .map(|row| self.columns.iter().map(|c| c.data.cell(row).to_text()).collect())
            .collect();
        RawTable::new(columns, rows)
    }
}

/// Output of the wrangler
///
/// Columns are the dimensions in their original order, then `REF_DATE`,
/// then `VALUE`. The value column is always numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct WrangledTable {
    pub(crate) table: Table,
    pub(crate) value_flags: Vec<Option<SentinelKind>>,
    pub(crate) granularity: Option<PeriodGranularity>,
}

impl WrangledTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn height(&self) -> usize {
        self.table.height()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.table.column_names()
    }

    pub fn values(&self) -> &[Option<f64>] {
        match self.table.column(columns::VALUE).map(|c| &c.data) {
            Some(ColumnData::Number(values)) => values,
            _ => &[],
        }
    }

    /// Sentinel that blanked the value of a row, if any
    pub fn value_flag(&self, row: usize) -> Option<SentinelKind> {
        self.value_flags.get(row).copied().flatten()
    }

    pub fn granularity(&self) -> Option<PeriodGranularity> {
        self.granularity
    }

    /// Canonical text rendering; wrangling it again yields the same table
    pub fn to_raw(&self) -> RawTable {
        self.table.to_raw()
    }

    /// Stable chronological copy, rows without a period last
    pub fn sorted_by_period(&self) -> WrangledTable {
        let dates = match self.table.column(columns::REF_DATE).map(|c| &c.data) {
            Some(ColumnData::Date(dates)) => dates.clone(),
            _ => return self.clone(),
        };
        let mut order: Vec<usize> = (0..self.height()).collect();
        order.sort_by_key(|&i| (dates[i].is_none(), dates[i]));
        WrangledTable {
            table: self.table.take(&order),
            value_flags: order.iter().map(|&i| self.value_flags[i]).collect(),
            granularity: self.granularity,
        }
    }
}
