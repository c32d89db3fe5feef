//! Dataset fetcher.
//!
//! Turns a hyphenated table number into the agency's full-table archive
//! URL, downloads the zip and extracts its single CSV payload. The
//! `_MetaData.csv` companion, when present, supplies the dataset title.

use crate::config::StatCanConfig;
use crate::constants::{METADATA_FILE_SUFFIX, TABLE_NUMBER_PATTERN};
use crate::delimited;
use crate::error::{Result, StatCanError};
use crate::models::{Language, RawTable};
use crate::transport::{HttpTransport, Transport, TransportError};
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static TABLE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TABLE_NUMBER_PATTERN).expect("Invalid regex"));

/// Validate a table number and return its eight-digit product id
///
/// `34-10-0281-01` becomes `34100281`; the trailing view number is not
/// part of the archive name.
pub fn product_id(table_number: &str) -> Result<String> {
    let trimmed = table_number.trim();
    if !TABLE_NUMBER_RE.is_match(trimmed) {
        return Err(StatCanError::InvalidIdentifier {
            value: table_number.to_string(),
        });
    }
    Ok(trimmed[..trimmed.len() - 3].replace('-', ""))
}

/// Archive location for a product id in one language
pub fn archive_url(base_url: &str, product_id: &str, language: Language) -> String {
    format!(
        "{}/n1/{}/tbl/csv/{}-{}.zip",
        base_url.trim_end_matches('/'),
        language.code(),
        product_id,
        language.conventions().archive_suffix
    )
}

/// Raw payload of one downloaded table
#[derive(Debug, Clone)]
pub struct FetchedTable {
    pub table_number: String,
    pub product_id: String,
    pub language: Language,
    pub raw: RawTable,
}

#[derive(Debug, Clone)]
pub struct DatasetFetcher<T: Transport = HttpTransport> {
    base_url: String,
    transport: T,
}

impl DatasetFetcher<HttpTransport> {
    pub fn from_config(config: &StatCanConfig) -> Result<Self> {
        Ok(Self::new(config.base_url.clone(), HttpTransport::new(config)?))
    }
}

impl<T: Transport> DatasetFetcher<T> {
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    /// Download and extract the table payload
    pub fn fetch(&self, table_number: &str, language: Language) -> Result<FetchedTable> {
        let product_id = product_id(table_number)?;
        let url = archive_url(&self.base_url, &product_id, language);
        info!("Downloading table {} ({}) from {}", table_number, language, url);

        let bytes = self.transport.get(&url).map_err(|e| match e {
            TransportError::NotFound => StatCanError::DatasetNotFound {
                table_number: table_number.to_string(),
                url: url.clone(),
            },
            TransportError::Failed(reason) => StatCanError::SourceUnavailable {
                url: url.clone(),
                reason,
            },
        })?;

        let raw = extract_payload(table_number, &bytes)?;
        info!(
            "Extracted {} rows x {} columns for table {}",
            raw.height(),
            raw.width(),
            table_number
        );

        Ok(FetchedTable {
            table_number: table_number.trim().to_string(),
            product_id,
            language,
            raw,
        })
    }
}

fn malformed(table_number: &str, reason: impl Into<String>) -> StatCanError {
    StatCanError::MalformedArchive {
        table_number: table_number.to_string(),
        reason: reason.into(),
    }
}

/// Read the single CSV payload (and optional title) out of a zip archive
pub fn extract_payload(table_number: &str, bytes: &[u8]) -> Result<RawTable> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| malformed(table_number, format!("not a zip archive: {}", e)))?;

    let mut payloads = Vec::new();
    let mut metadata = None;
    for index in 0..archive.len() {
        let file = archive
            .by_index(index)
            .map_err(|e| malformed(table_number, format!("unreadable entry {}: {}", index, e)))?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let lower = name.to_lowercase();
        if lower.ends_with(METADATA_FILE_SUFFIX) {
            metadata = Some(index);
        } else if lower.ends_with(".csv") {
            payloads.push(index);
        } else {
            debug!("Ignoring archive entry {}", name);
        }
    }

    let payload = match payloads.as_slice() {
        [index] => *index,
        [] => return Err(malformed(table_number, "archive contains no CSV payload")),
        many => {
            return Err(malformed(
                table_number,
                format!("archive contains {} candidate CSV payloads", many.len()),
            ));
        }
    };

    let contents = read_entry(&mut archive, payload)
        .map_err(|e| malformed(table_number, format!("failed to extract payload: {}", e)))?;
    let mut raw = delimited::parse(&contents).map_err(|e| malformed(table_number, e.to_string()))?;

    if let Some(index) = metadata {
        match read_entry(&mut archive, index) {
            Ok(bytes) => match dataset_title(&bytes) {
                Some(title) => raw.name = Some(title),
                None => warn!("Metadata file for {} has no title line", table_number),
            },
            Err(e) => warn!("Could not read metadata file for {}: {}", table_number, e),
        }
    }

    Ok(raw)
}

fn read_entry(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    index: usize,
) -> std::io::Result<Vec<u8>> {
    let mut file = archive.by_index(index)?;
    let mut buffer = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// First field of the second line of the metadata file
fn dataset_title(bytes: &[u8]) -> Option<String> {
    let text = delimited::decode(bytes);
    let line = text.lines().nth(1)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let record = reader.records().next()?.ok()?;
    record
        .get(0)
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}
