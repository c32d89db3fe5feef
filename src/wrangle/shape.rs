//! Layout detection and wide-to-long normalization.
//!
//! A table is long when it names a reference-period or value column.
//! Otherwise every header that reads as a period literal is a period
//! column of a wide table and gets pivoted into one row per
//! (dimensions, period) pair.

use super::period::parse_period;
use crate::config::{LocaleConventions, WranglerConfig};
use crate::models::RawTable;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Layout {
    Long {
        period: Option<usize>,
        value: Option<usize>,
    },
    Wide {
        periods: Vec<usize>,
    },
}

impl Layout {
    /// Whether a raw column is the period or value column of a long table
    pub(crate) fn is_structural(&self, column: usize) -> bool {
        match self {
            Layout::Long { period, value } => *period == Some(column) || *value == Some(column),
            Layout::Wide { .. } => false,
        }
    }

    fn is_period(&self, column: usize) -> bool {
        match self {
            Layout::Long { period, .. } => *period == Some(column),
            Layout::Wide { periods } => periods.contains(&column),
        }
    }
}

pub(crate) fn detect_layout(
    raw: &RawTable,
    config: &WranglerConfig,
    conventions: &LocaleConventions,
) -> Layout {
    let period = raw.columns.iter().position(|c| config.is_period_column(c));
    let value = raw.columns.iter().position(|c| config.is_value_column(c));
    if period.is_some() || value.is_some() {
        debug!("Long layout (period column {:?}, value column {:?})", period, value);
        return Layout::Long { period, value };
    }

    let periods: Vec<usize> = raw
        .columns
        .iter()
        .enumerate()
        .filter(|(_, header)| parse_period(header, conventions).is_some())
        .map(|(index, _)| index)
        .collect();
    debug!("Wide layout with {} period columns", periods.len());
    Layout::Wide { periods }
}

/// Long-form rows, still as text
#[derive(Debug, Clone, Default)]
pub(crate) struct LongRows {
    pub dimension_names: Vec<String>,
    /// Column-major dimension cells
    pub dimensions: Vec<Vec<String>>,
    pub periods: Vec<String>,
    pub values: Vec<String>,
    /// Raw row each long row came from
    pub source_rows: Vec<usize>,
    /// Header of the column periods were read from, if any
    pub period_header: Option<String>,
    /// Header of the column values were read from, if any
    pub value_header: Option<String>,
}

impl LongRows {
    fn push(&mut self, raw_row: &[String], dims: &[usize], period: &str, value: &str, source: usize) {
        for (slot, &index) in self.dimensions.iter_mut().zip(dims) {
            slot.push(raw_row[index].clone());
        }
        self.periods.push(period.to_string());
        self.values.push(value.to_string());
        self.source_rows.push(source);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Drop dimensions left with only missing cells once rows were dropped
    pub fn drop_empty_dimensions(&mut self, is_missing: impl Fn(&str) -> bool) {
        if self.len() == 0 {
            return;
        }
        let keep: Vec<bool> = self
            .dimensions
            .iter()
            .map(|cells| !cells.iter().all(|c| is_missing(c)))
            .collect();
        for (name, _) in self.dimension_names.iter().zip(&keep).filter(|(_, k)| !**k) {
            debug!("Dropping column '{}': content only in dropped rows", name);
        }

        let mut flags = keep.iter();
        self.dimension_names.retain(|_| flags.next().copied().unwrap_or(true));
        let mut flags = keep.iter();
        self.dimensions.retain(|_| flags.next().copied().unwrap_or(true));
    }
}

/// Normalize to long form
///
/// `dropped` marks raw columns removed before reshaping and `is_missing`
/// says whether a cell is blank or a sentinel. Long rows with nothing but
/// missing cells are dropped; in wide tables a raw row whose every period
/// cell is missing is dropped.
pub(crate) fn to_long(
    raw: &RawTable,
    layout: &Layout,
    dropped: &[bool],
    is_missing: impl Fn(&str) -> bool,
) -> LongRows {
    let dims: Vec<usize> = (0..raw.width())
        .filter(|&i| !dropped[i] && !layout.is_structural(i) && !layout.is_period(i))
        .collect();

    let mut long = LongRows {
        dimension_names: dims.iter().map(|&i| raw.columns[i].clone()).collect(),
        dimensions: vec![Vec::new(); dims.len()],
        ..Default::default()
    };
    let dims_missing = |row: &[String]| dims.iter().all(|&i| is_missing(&row[i]));
    let mut skipped = 0usize;

    match layout {
        Layout::Long { period, value } => {
            long.period_header = period.map(|i| raw.columns[i].clone());
            long.value_header = value.map(|i| raw.columns[i].clone());
            for (index, row) in raw.rows.iter().enumerate() {
                let period_cell = period.map_or("", |i| row[i].as_str());
                let value_cell = value.map_or("", |i| row[i].as_str());
                if is_missing(value_cell) && is_missing(period_cell) && dims_missing(row) {
                    skipped += 1;
                    continue;
                }
                long.push(row, &dims, period_cell, value_cell, index);
            }
        }
        Layout::Wide { periods } => {
            let periods: Vec<usize> = periods.iter().copied().filter(|&i| !dropped[i]).collect();
            for (index, row) in raw.rows.iter().enumerate() {
                if periods.is_empty() {
                    if dims_missing(row) {
                        skipped += 1;
                        continue;
                    }
                    long.push(row, &dims, "", "", index);
                    continue;
                }
                if periods.iter().all(|&i| is_missing(&row[i])) {
                    skipped += 1;
                    continue;
                }
                for &i in &periods {
                    long.push(row, &dims, &raw.columns[i], &row[i], index);
                }
            }
        }
    }

    if skipped > 0 {
        debug!("Dropped {} rows without publishable content", skipped);
    }
    long
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    fn raw(columns: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            columns.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn layout_of(table: &RawTable) -> Layout {
        detect_layout(table, &WranglerConfig::default(), Language::English.conventions())
    }

    fn missing(cell: &str) -> bool {
        cell.is_empty() || cell == "x"
    }

    #[test]
    fn test_detects_long() {
        let table = raw(&["REF_DATE", "GEO", "VALUE"], &[]);
        assert_eq!(
            layout_of(&table),
            Layout::Long {
                period: Some(0),
                value: Some(2)
            }
        );
    }

    #[test]
    fn test_detects_wide() {
        let table = raw(&["Geography", "2019", "2020", "Q1 2021", "Notes"], &[]);
        assert_eq!(
            layout_of(&table),
            Layout::Wide {
                periods: vec![1, 2, 3]
            }
        );
    }

    #[test]
    fn test_pivot_wide() {
        let table = raw(
            &["Geography", "2019", "2020"],
            &[&["Canada", "1", "2"], &["Ontario", "x", ""], &["Quebec", "3", "x"]],
        );
        let layout = layout_of(&table);
        let long = to_long(&table, &layout, &[false; 3], missing);

        // Ontario has no publishable period cell
        assert_eq!(long.len(), 4);
        assert_eq!(long.dimension_names, vec!["Geography"]);
        assert_eq!(long.dimensions[0], vec!["Canada", "Canada", "Quebec", "Quebec"]);
        assert_eq!(long.periods, vec!["2019", "2020", "2019", "2020"]);
        assert_eq!(long.values, vec!["1", "2", "3", "x"]);
        assert_eq!(long.source_rows, vec![0, 0, 2, 2]);
    }

    #[test]
    fn test_wide_without_period_columns_degenerates() {
        let table = raw(&["Geography", "Sex"], &[&["Canada", "Both"], &["", ""]]);
        let layout = layout_of(&table);
        let long = to_long(&table, &layout, &[false; 2], missing);
        assert_eq!(long.len(), 1);
        assert_eq!(long.periods, vec![""]);
        assert_eq!(long.values, vec![""]);
    }

    #[test]
    fn test_long_keeps_suppressed_rows_with_content() {
        let table = raw(
            &["REF_DATE", "GEO", "VALUE"],
            &[&["2020", "Canada", "x"], &["", "", "x"], &["2021", "Canada", "5"]],
        );
        let layout = layout_of(&table);
        let long = to_long(&table, &layout, &[false; 3], missing);
        assert_eq!(long.len(), 2);
        assert_eq!(long.source_rows, vec![0, 2]);
        assert_eq!(long.period_header.as_deref(), Some("REF_DATE"));
    }

    #[test]
    fn test_dimension_emptied_by_row_drop() {
        let table = raw(
            &["Geography", "Notes", "2019", "2020"],
            &[&["Canada", "", "1", "2"], &["Ontario", "revised", "x", ""]],
        );
        let layout = layout_of(&table);
        let mut long = to_long(&table, &layout, &[false; 4], missing);
        assert_eq!(long.dimension_names, vec!["Geography", "Notes"]);

        long.drop_empty_dimensions(missing);
        assert_eq!(long.dimension_names, vec!["Geography"]);
        assert_eq!(long.dimensions, vec![vec!["Canada", "Canada"]]);
    }

    #[test]
    fn test_dropped_columns_are_excluded() {
        let table = raw(&["GEO", "TERMINATED", "2020"], &[&["Canada", "", "1"]]);
        let layout = layout_of(&table);
        let long = to_long(&table, &layout, &[false, true, false], missing);
        assert_eq!(long.dimension_names, vec!["GEO"]);
    }
}
