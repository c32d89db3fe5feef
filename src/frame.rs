//! Dataframe facade.
//!
//! Hands a typed [`Table`] to the caller either as-is (the native backend)
//! or as a polars `DataFrame` when the `polars` feature is enabled. Both
//! backends answer the same questions so callers can switch freely.

use crate::constants::DEFAULT_HEAD_ROWS;
use crate::error::{Result, StatCanError};
use crate::models::{Cell, Table};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

#[cfg(feature = "polars")]
use polars::prelude::DataFrame;

/// Dataframe implementation behind a [`DataframeHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// In-crate column store
    #[default]
    Native,
    /// Polars `DataFrame`
    Polars,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Native => f.write_str("native"),
            Backend::Polars => f.write_str("polars"),
        }
    }
}

impl FromStr for Backend {
    type Err = StatCanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(Backend::Native),
            "polars" => Ok(Backend::Polars),
            other => Err(StatCanError::Configuration {
                message: format!("unknown dataframe backend '{}' (expected native or polars)", other),
            }),
        }
    }
}

#[derive(Debug, Clone)]
enum Frame {
    Native(Table),
    #[cfg(feature = "polars")]
    Polars(DataFrame),
}

/// Backend-neutral view over a dataframe
#[derive(Debug, Clone)]
pub struct DataframeHandle {
    frame: Frame,
}

/// Convert a table to the requested backend
pub fn to_dataframe(table: &Table, backend: Backend) -> Result<DataframeHandle> {
    debug!(
        "Converting {} x {} table to {} dataframe",
        table.height(),
        table.width(),
        backend
    );
    let frame = match backend {
        Backend::Native => Frame::Native(table.clone()),
        #[cfg(feature = "polars")]
        Backend::Polars => Frame::Polars(polars_backend::from_table(table)?),
        #[cfg(not(feature = "polars"))]
        Backend::Polars => {
            return Err(StatCanError::BackendUnavailable {
                backend: backend.to_string(),
                hint: "rebuild with `--features polars`".to_string(),
            });
        }
    };
    Ok(DataframeHandle { frame })
}

impl DataframeHandle {
    pub fn backend(&self) -> Backend {
        match &self.frame {
            Frame::Native(_) => Backend::Native,
            #[cfg(feature = "polars")]
            Frame::Polars(_) => Backend::Polars,
        }
    }

    pub fn height(&self) -> usize {
        match &self.frame {
            Frame::Native(table) => table.height(),
            #[cfg(feature = "polars")]
            Frame::Polars(df) => df.height(),
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        match &self.frame {
            Frame::Native(table) => table.column_names().into_iter().map(String::from).collect(),
            #[cfg(feature = "polars")]
            Frame::Polars(df) => df
                .get_column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }

    /// First `n` rows (default 5) as a new handle; `n` is clamped to the row count
    pub fn head(&self, n: Option<usize>) -> DataframeHandle {
        let n = n.unwrap_or(DEFAULT_HEAD_ROWS).min(self.height());
        let frame = match &self.frame {
            Frame::Native(table) => Frame::Native(table.head(n)),
            #[cfg(feature = "polars")]
            Frame::Polars(df) => Frame::Polars(df.head(Some(n))),
        };
        DataframeHandle { frame }
    }

    /// Cells of one column, `None` if there is no such column
    pub fn column(&self, name: &str) -> Result<Option<Vec<Cell>>> {
        match &self.frame {
            Frame::Native(table) => Ok(table
                .column(name)
                .map(|c| (0..table.height()).map(|row| c.data.cell(row)).collect())),
            #[cfg(feature = "polars")]
            Frame::Polars(df) => match df.column(name) {
                Ok(column) => polars_backend::cells(column).map(Some),
                Err(_) => Ok(None),
            },
        }
    }

    /// Column name to cells
    pub fn to_dict(&self) -> Result<BTreeMap<String, Vec<Cell>>> {
        let mut dict = BTreeMap::new();
        for name in self.column_names() {
            if let Some(cells) = self.column(&name)? {
                dict.insert(name, cells);
            }
        }
        Ok(dict)
    }

    /// `{"columns": [...], "data": [[...], ...]}` with rows in order
    pub fn to_json(&self) -> Result<Value> {
        let names = self.column_names();
        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            columns.push(self.column(name)?.unwrap_or_default());
        }
        let data: Vec<Vec<&Cell>> = (0..self.height())
            .map(|row| columns.iter().map(|cells| &cells[row]).collect())
            .collect();
        Ok(json!({ "columns": names, "data": data }))
    }

    /// Write the frame as CSV with a header row; missing cells are empty
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let save_failed = |reason: String| StatCanError::SaveFailed {
            path: path.to_path_buf(),
            reason,
        };

        match &self.frame {
            Frame::Native(table) => {
                let mut writer = csv::Writer::from_path(path).map_err(|e| save_failed(e.to_string()))?;
                writer
                    .write_record(table.column_names())
                    .map_err(|e| save_failed(e.to_string()))?;
                for row in 0..table.height() {
                    let record: Vec<String> = table
                        .columns()
                        .iter()
                        .map(|c| c.data.cell(row).to_text())
                        .collect();
                    writer.write_record(&record).map_err(|e| save_failed(e.to_string()))?;
                }
                writer.flush()?;
            }
            #[cfg(feature = "polars")]
            Frame::Polars(df) => {
                polars_backend::write_csv(df, path).map_err(|e| save_failed(e.to_string()))?;
            }
        }

        info!("Wrote {} rows to {}", self.height(), path.display());
        Ok(())
    }

    #[cfg(feature = "polars")]
    pub fn as_polars(&self) -> Option<&DataFrame> {
        match &self.frame {
            Frame::Polars(df) => Some(df),
            Frame::Native(_) => None,
        }
    }
}

impl fmt::Display for DataframeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.frame {
            Frame::Native(table) => render_table(table, f),
            #[cfg(feature = "polars")]
            Frame::Polars(df) => write!(f, "{}", df),
        }
    }
}

fn render_table(table: &Table, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names = table.column_names();
    let rows: Vec<Vec<String>> = (0..table.height())
        .map(|row| {
            table
                .columns()
                .iter()
                .map(|c| c.data.cell(row).to_string())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |f: &mut fmt::Formatter<'_>, cells: &[&str]| -> fmt::Result {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{:<width$}", cell))
            .collect();
        writeln!(f, "{}", padded.join("  ").trim_end())
    };

    line(f, &names)?;
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(|s| s.as_str()).collect();
        line(f, &cells)?;
    }
    write!(f, "[{} rows x {} columns]", table.height(), table.width())
}

#[cfg(feature = "polars")]
mod polars_backend {
    use crate::error::Result;
    use crate::models::{Cell, ColumnData, Table};
    use chrono::{Datelike, NaiveDate};
    use polars::prelude::*;
    use std::fs::File;
    use std::path::Path;

    /// Days from 0001-01-01 to 1970-01-01
    const UNIX_EPOCH_FROM_CE: i32 = 719_163;

    fn to_days(date: NaiveDate) -> i32 {
        date.num_days_from_ce() - UNIX_EPOCH_FROM_CE
    }

    fn from_days(days: i32) -> Option<NaiveDate> {
        NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_FROM_CE)
    }

    pub(super) fn from_table(table: &Table) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(table.width());
        for column in table.columns() {
            let name: PlSmallStr = column.name.as_str().into();
            let series = match &column.data {
                ColumnData::Number(values) => Series::new(name, values.clone()),
                ColumnData::Date(dates) => {
                    let days: Vec<Option<i32>> = dates.iter().map(|d| d.map(to_days)).collect();
                    Series::new(name, days).cast(&DataType::Date)?
                }
                ColumnData::Text(values) => Series::new(name, values.clone()),
            };
            columns.push(Column::from(series));
        }
        Ok(DataFrame::new(columns)?)
    }

    pub(super) fn cells(column: &Column) -> Result<Vec<Cell>> {
        let series = column.as_materialized_series();
        let cells = match series.dtype() {
            DataType::Float64 => series
                .f64()?
                .into_iter()
                .map(|v| v.map_or(Cell::Missing, Cell::Number))
                .collect(),
            DataType::Date => {
                let days = series.cast(&DataType::Int32)?;
                days.i32()?
                    .into_iter()
                    .map(|v| v.and_then(from_days).map_or(Cell::Missing, Cell::Date))
                    .collect()
            }
            _ => {
                let text = series.cast(&DataType::String)?;
                text.str()?
                    .into_iter()
                    .map(|v| v.map_or(Cell::Missing, |s| Cell::Text(s.to_string())))
                    .collect()
            }
        };
        Ok(cells)
    }

    pub(super) fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        let mut df = df.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnData};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample(rows: usize) -> Table {
        let dates = (0..rows)
            .map(|i| NaiveDate::from_ymd_opt(2000 + i as i32, 1, 1))
            .collect();
        Table::new(vec![
            Column::new(
                "GEO",
                ColumnData::Text((0..rows).map(|i| Some(format!("geo{}", i))).collect()),
            ),
            Column::new("REF_DATE", ColumnData::Date(dates)),
            Column::new(
                "VALUE",
                ColumnData::Number((0..rows).map(|i| (i % 3 != 1).then_some(i as f64)).collect()),
            ),
        ])
    }

    #[test]
    fn test_head_defaults_and_clamps() {
        let handle = to_dataframe(&sample(12), Backend::Native).unwrap();
        assert_eq!(handle.head(None).height(), 5);
        assert_eq!(handle.head(Some(3)).height(), 3);
        assert_eq!(handle.head(Some(100)).height(), 12);
        // head leaves the original untouched
        assert_eq!(handle.height(), 12);

        let small = to_dataframe(&sample(2), Backend::Native).unwrap();
        assert_eq!(small.head(None).height(), 2);

        // zero rows keeps the header
        let header_only = handle.head(Some(0));
        assert_eq!(header_only.height(), 0);
        assert_eq!(header_only.column_names(), vec!["GEO", "REF_DATE", "VALUE"]);
        assert!(header_only.to_string().ends_with("[0 rows x 3 columns]"));
    }

    #[test]
    fn test_dict_and_columns() {
        let handle = to_dataframe(&sample(3), Backend::Native).unwrap();
        assert_eq!(handle.column_names(), vec!["GEO", "REF_DATE", "VALUE"]);

        let dict = handle.to_dict().unwrap();
        assert_eq!(
            dict["VALUE"],
            vec![Cell::Number(0.0), Cell::Missing, Cell::Number(2.0)]
        );
        assert!(handle.column("nope").unwrap().is_none());
    }

    #[test]
    fn test_json_keeps_column_order() {
        let handle = to_dataframe(&sample(2), Backend::Native).unwrap();
        let value = handle.to_json().unwrap();
        assert_eq!(value["columns"], json!(["GEO", "REF_DATE", "VALUE"]));
        assert_eq!(value["data"][0], json!(["geo0", "2000-01-01", 0.0]));
        assert_eq!(value["data"][1][2], Value::Null);
    }

    #[test]
    fn test_write_csv_native() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let handle = to_dataframe(&sample(2), Backend::Native).unwrap();
        handle.write_csv(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "GEO,REF_DATE,VALUE\ngeo0,2000-01-01,0\ngeo1,2001-01-01,\n");
    }

    #[test]
    fn test_display_renders_rows() {
        let handle = to_dataframe(&sample(2), Backend::Native).unwrap();
        let rendered = handle.to_string();
        assert!(rendered.starts_with("GEO"));
        assert!(rendered.contains("null"));
        assert!(rendered.ends_with("[2 rows x 3 columns]"));
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("Polars".parse::<Backend>().unwrap(), Backend::Polars);
        assert_eq!("native".parse::<Backend>().unwrap(), Backend::Native);
        assert!("spark".parse::<Backend>().is_err());
    }

    #[cfg(not(feature = "polars"))]
    #[test]
    fn test_polars_unavailable_without_feature() {
        assert!(matches!(
            to_dataframe(&sample(1), Backend::Polars),
            Err(StatCanError::BackendUnavailable { .. })
        ));
    }

    #[cfg(feature = "polars")]
    #[test]
    fn test_polars_matches_native() {
        let table = sample(7);
        let native = to_dataframe(&table, Backend::Native).unwrap();
        let polars = to_dataframe(&table, Backend::Polars).unwrap();

        assert_eq!(polars.backend(), Backend::Polars);
        assert_eq!(polars.height(), 7);
        assert_eq!(polars.column_names(), native.column_names());
        assert_eq!(polars.to_dict().unwrap(), native.to_dict().unwrap());
        assert_eq!(polars.head(None).height(), 5);
        assert!(polars.as_polars().is_some());
    }

    #[cfg(feature = "polars")]
    #[test]
    fn test_write_csv_polars() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let handle = to_dataframe(&sample(2), Backend::Polars).unwrap();
        handle.write_csv(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("GEO,REF_DATE,VALUE"));
        assert!(lines.next().unwrap().starts_with("geo0,2000-01-01,"));
    }
}
