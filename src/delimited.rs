//! Delimited text parsing shared by the catalog adapter and the fetcher.
//!
//! Decodes the payload (UTF-8 with BOM removal, Latin-1 fallback), sniffs
//! the delimiter from the header line and reads every record into a
//! [`RawTable`] of untyped text cells.

use crate::constants::CANDIDATE_DELIMITERS;
use crate::models::RawTable;
use thiserror::Error;
use tracing::debug;

/// Why a payload could not be read as a table
#[derive(Error, Debug)]
pub enum DelimitedError {
    #[error("payload is empty")]
    Empty,

    #[error("payload looks like markup, not delimited text")]
    NotTabular,

    #[error("no header row found")]
    MissingHeader,

    #[error("record {line} has {found} fields but the header has {expected}")]
    RaggedRecord {
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Decode raw bytes into text
pub fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            debug!("Payload is not UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// Pick the candidate delimiter occurring most often in the header line
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let mut best = CANDIDATE_DELIMITERS[0];
    let mut best_count = 0;
    for &candidate in CANDIDATE_DELIMITERS {
        let mut in_quotes = false;
        let count = header
            .bytes()
            .filter(|&b| {
                if b == b'"' {
                    in_quotes = !in_quotes;
                }
                !in_quotes && b == candidate
            })
            .count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Parse a delimited payload with a header row
pub fn parse(bytes: &[u8]) -> Result<RawTable, DelimitedError> {
    let text = decode(bytes);
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Err(DelimitedError::Empty);
    }
    if trimmed.starts_with('<') {
        return Err(DelimitedError::NotTabular);
    }

    let delimiter = sniff_delimiter(trimmed);
    debug!("Using delimiter {:?}", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(trimmed.as_bytes());

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(DelimitedError::MissingHeader);
    }

    let width = columns.len();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() > width {
            return Err(DelimitedError::RaggedRecord {
                line: record.position().map_or(0, |p| p.line()),
                found: record.len(),
                expected: width,
            });
        }
        // Single-field lines in a wider table are trailing notes
        if record.len() == 1 && width > 1 {
            debug!("Skipping note line: {}", &record[0]);
            continue;
        }
        rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }

    Ok(RawTable::new(columns, rows))
}
