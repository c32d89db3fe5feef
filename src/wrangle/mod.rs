//! Table wrangler.
//!
//! Turns a [`RawTable`] of text cells into a typed [`WrangledTable`]:
//! - columns made only of blanks and sentinel tokens are dropped
//! - wide tables are pivoted to long form
//! - dimension columns are typed as numbers, dates or text
//! - the reference period becomes a calendar date in `REF_DATE`
//! - the value column becomes numeric `VALUE`, sentinels flagged as missing
//!
//! Output columns are the dimensions in original order, then `REF_DATE`,
//! then `VALUE`.

pub mod numeric;
pub mod period;
pub(crate) mod shape;

use self::numeric::parse_number;
use self::period::parse_period;
use self::shape::{Layout, LongRows};
use crate::config::{LocaleConventions, WranglerConfig};
use crate::constants::columns;
use crate::error::{Result, StatCanError};
use crate::models::{
    Column, ColumnData, Language, PeriodGranularity, RawTable, SentinelKind, Table, WrangledTable,
};
use tracing::{debug, info};

/// Wrangle with the default rule set
pub fn wrangle(raw: RawTable, language: Language) -> Result<WrangledTable> {
    Wrangler::default().wrangle(raw, language)
}

/// Table wrangler bound to one rule set
#[derive(Debug, Clone, Default)]
pub struct Wrangler {
    config: WranglerConfig,
}

impl Wrangler {
    pub fn new(config: WranglerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WranglerConfig {
        &self.config
    }

    fn is_missing(&self, cell: &str) -> bool {
        cell.trim().is_empty() || self.config.sentinel(cell).is_some()
    }

    pub fn wrangle(&self, raw: RawTable, language: Language) -> Result<WrangledTable> {
        let conventions = language.conventions();
        let layout = shape::detect_layout(&raw, &self.config, conventions);

        let dropped = self.empty_columns(&raw, &layout);
        let mut long = shape::to_long(&raw, &layout, &dropped, |cell| self.is_missing(cell));
        long.drop_empty_dimensions(|cell| self.is_missing(cell));

        let mut output: Vec<Column> = long
            .dimension_names
            .iter()
            .zip(&long.dimensions)
            .map(|(name, cells)| Column::new(name.clone(), self.infer_column(name, cells, conventions)))
            .collect();

        if let Some(title) = &raw.name {
            push_constant(&mut output, columns::INDICATOR, title, long.len());
        }

        let (dates, granularity) = self.parse_periods(&long, &layout, conventions)?;
        if granularity == Some(PeriodGranularity::FiscalYear) {
            push_constant(&mut output, columns::REF_PERIOD, columns::FISCAL_YEAR, long.len());
        }
        let (values, value_flags) = self.parse_values(&long, conventions)?;
        output.push(Column::new(columns::REF_DATE, ColumnData::Date(dates)));
        output.push(Column::new(columns::VALUE, ColumnData::Number(values)));

        let table = Table::new(output);
        info!(
            "Wrangled {} raw rows into {} rows x {} columns",
            raw.height(),
            table.height(),
            table.width()
        );

        Ok(WrangledTable {
            table,
            value_flags,
            granularity,
        })
    }

    /// Columns whose every cell is blank or a sentinel
    fn empty_columns(&self, raw: &RawTable, layout: &Layout) -> Vec<bool> {
        (0..raw.width())
            .map(|index| {
                let empty = raw.height() > 0
                    && !layout.is_structural(index)
                    && raw.column_values(index).all(|cell| self.is_missing(cell));
                if empty {
                    debug!("Dropping column '{}': no publishable values", raw.columns[index]);
                }
                empty
            })
            .collect()
    }

    fn infer_column(&self, name: &str, cells: &[String], conventions: &LocaleConventions) -> ColumnData {
        let text = || {
            ColumnData::Text(
                cells
                    .iter()
                    .map(|c| Some(c.trim().to_string()).filter(|c| !c.is_empty()))
                    .collect(),
            )
        };

        if self.config.is_text_column(name) {
            return text();
        }

        let candidates: Vec<&str> = cells
            .iter()
            .map(|c| c.as_str())
            .filter(|c| !self.is_missing(c))
            .collect();
        if candidates.is_empty() {
            return text();
        }

        let footnotes = &self.config.footnote_markers;
        if candidates
            .iter()
            .all(|c| parse_number(c, conventions, footnotes).is_some())
        {
            debug!("Column '{}' is numeric", name);
            return ColumnData::Number(
                cells
                    .iter()
                    .map(|c| parse_number(c, conventions, footnotes))
                    .collect(),
            );
        }

        if candidates
            .iter()
            .all(|c| parse_period(c, conventions).is_some())
        {
            debug!("Column '{}' holds reference periods", name);
            return ColumnData::Date(
                cells
                    .iter()
                    .map(|c| parse_period(c, conventions).map(|p| p.date))
                    .collect(),
            );
        }

        text()
    }

    fn parse_periods(
        &self,
        long: &LongRows,
        layout: &Layout,
        conventions: &LocaleConventions,
    ) -> Result<(Vec<Option<chrono::NaiveDate>>, Option<PeriodGranularity>)> {
        let column = long
            .period_header
            .clone()
            .unwrap_or_else(|| columns::REF_DATE.to_string());

        let mut dates = Vec::with_capacity(long.len());
        let mut granularities = Vec::new();
        for (index, cell) in long.periods.iter().enumerate() {
            if self.is_missing(cell) {
                dates.push(None);
                continue;
            }
            let parsed = parse_period(cell, conventions).ok_or_else(|| StatCanError::Wrangling {
                column: column.clone(),
                row: long.source_rows[index],
                value: cell.clone(),
                reason: match layout {
                    Layout::Long { .. } => "unrecognized reference period".to_string(),
                    Layout::Wide { .. } => "unrecognized period header".to_string(),
                },
            })?;
            if !granularities.contains(&parsed.granularity) {
                granularities.push(parsed.granularity);
            }
            dates.push(Some(parsed.date));
        }

        let granularity = match granularities.as_slice() {
            [single] => Some(*single),
            _ => None,
        };
        Ok((dates, granularity))
    }

    #[allow(clippy::type_complexity)]
    fn parse_values(
        &self,
        long: &LongRows,
        conventions: &LocaleConventions,
    ) -> Result<(Vec<Option<f64>>, Vec<Option<SentinelKind>>)> {
        let mut values = Vec::with_capacity(long.len());
        let mut flags = Vec::with_capacity(long.len());

        for (index, cell) in long.values.iter().enumerate() {
            if cell.trim().is_empty() {
                values.push(None);
                flags.push(None);
                continue;
            }
            if let Some(kind) = self.config.sentinel(cell) {
                values.push(None);
                flags.push(Some(kind));
                continue;
            }
            let value = parse_number(cell, conventions, &self.config.footnote_markers).ok_or_else(|| {
                StatCanError::Wrangling {
                    column: long
                        .value_header
                        .clone()
                        .or_else(|| long.period_header.clone())
                        .unwrap_or_else(|| long.periods[index].clone()),
                    row: long.source_rows[index],
                    value: cell.clone(),
                    reason: "not a number".to_string(),
                }
            })?;
            values.push(Some(value));
            flags.push(None);
        }

        Ok((values, flags))
    }
}

/// Append a constant text dimension unless a column of that name exists
fn push_constant(output: &mut Vec<Column>, name: &str, text: &str, height: usize) {
    if output.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
        return;
    }
    output.push(Column::new(
        name,
        ColumnData::Text(vec![Some(text.to_string()); height]),
    ));
}
