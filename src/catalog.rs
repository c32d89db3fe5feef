//! Catalog source adapter.
//!
//! Fetches the published dataset listing and hands it back as a
//! [`RawTable`]. Converting those rows into [`CatalogEntry`] values
//! tolerates renamed and reordered upstream columns.

use crate::config::StatCanConfig;
use crate::delimited::{self, DelimitedError};
use crate::error::{Result, StatCanError};
use crate::models::{CatalogEntry, Language, RawTable};
use crate::transport::{HttpTransport, Transport, TransportError};
use tracing::{debug, info, warn};

/// Anything that can produce the current catalog rows
pub trait CatalogSource {
    fn fetch_catalog(&self) -> Result<RawTable>;
}

/// Catalog fetched from a URL
#[derive(Debug, Clone)]
pub struct HttpCatalogSource<T: Transport = HttpTransport> {
    url: String,
    transport: T,
}

impl HttpCatalogSource<HttpTransport> {
    pub fn from_config(config: &StatCanConfig) -> Result<Self> {
        Ok(Self::new(config.catalog_url.clone(), HttpTransport::new(config)?))
    }
}

impl<T: Transport> HttpCatalogSource<T> {
    pub fn new(url: impl Into<String>, transport: T) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }
}

impl<T: Transport> CatalogSource for HttpCatalogSource<T> {
    fn fetch_catalog(&self) -> Result<RawTable> {
        info!("Fetching catalog from {}", self.url);
        let body = self.transport.get(&self.url).map_err(|e| {
            let reason = match e {
                TransportError::NotFound => "catalog feed not found".to_string(),
                TransportError::Failed(reason) => reason,
            };
            StatCanError::SourceUnavailable {
                url: self.url.clone(),
                reason,
            }
        })?;
        parse_catalog(&body, &self.url)
    }
}

/// Catalog bytes already in memory
#[derive(Debug, Clone)]
pub struct StaticCatalogSource {
    bytes: Vec<u8>,
}

impl StaticCatalogSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl CatalogSource for StaticCatalogSource {
    fn fetch_catalog(&self) -> Result<RawTable> {
        parse_catalog(&self.bytes, "<memory>")
    }
}

fn parse_catalog(bytes: &[u8], origin: &str) -> Result<RawTable> {
    delimited::parse(bytes).map_err(|e| match e {
        DelimitedError::Empty | DelimitedError::NotTabular => StatCanError::SourceUnavailable {
            url: origin.to_string(),
            reason: format!("non-tabular payload: {}", e),
        },
        other => StatCanError::MalformedCatalog {
            reason: other.to_string(),
        },
    })
}

const ID_ALIASES: &[&str] = &["id", "data_id", "productid", "product_id", "table_number"];
const TITLE_ALIASES: &[&str] = &["title", "title_en", "title_fr", "cubetitle"];
const DESCRIPTION_ALIASES: &[&str] = &["description", "desc"];
const RELEASE_ALIASES: &[&str] = &["release_date", "releasetime", "release_time"];
const LANG_ALIASES: &[&str] = &["lang", "language", "locale"];

fn find_column(raw: &RawTable, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| raw.column_index(alias))
}

fn require_column(raw: &RawTable, aliases: &[&str]) -> Result<usize> {
    find_column(raw, aliases).ok_or_else(|| StatCanError::MalformedCatalog {
        reason: format!(
            "no '{}' column in header [{}]",
            aliases[0],
            raw.columns.join(", ")
        ),
    })
}

/// Convert catalog rows into entries, in catalog order
pub fn parse_entries(raw: &RawTable) -> Result<Vec<CatalogEntry>> {
    let id = require_column(raw, ID_ALIASES)?;
    let title = require_column(raw, TITLE_ALIASES)?;
    let lang = require_column(raw, LANG_ALIASES)?;
    let description = find_column(raw, DESCRIPTION_ALIASES);
    let release = find_column(raw, RELEASE_ALIASES);

    let mut entries = Vec::with_capacity(raw.height());
    let mut skipped = 0usize;
    for (line, row) in raw.rows.iter().enumerate() {
        let language = match row[lang].parse::<Language>() {
            Ok(language) => language,
            Err(_) => {
                warn!("Skipping catalog row {}: unknown language '{}'", line + 1, row[lang]);
                skipped += 1;
                continue;
            }
        };
        if row[id].is_empty() {
            debug!("Skipping catalog row {}: empty id", line + 1);
            skipped += 1;
            continue;
        }

        entries.push(CatalogEntry {
            id: row[id].clone(),
            title: row[title].clone(),
            description: description.map(|i| row[i].clone()).unwrap_or_default(),
            release_date: release.map(|i| row[i].clone()).filter(|s| !s.is_empty()),
            language,
        });
    }

    debug!("Parsed {} catalog entries ({} skipped)", entries.len(), skipped);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    const CATALOG: &str = "title,id,description,release_date,lang\n\
        Labour force characteristics by province,34-10-0281-01,Monthly estimates,2024-01-05,en\n\
        Caractéristiques de la population active,34-10-0281-01,Estimations mensuelles,2024-01-05,fr\n\
        Something else,11-11-1111-11,,,de\n";

    #[test]
    fn test_parse_entries() {
        let raw = StaticCatalogSource::new(CATALOG).fetch_catalog().unwrap();
        let entries = parse_entries(&raw).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "34-10-0281-01");
        assert_eq!(entries[0].language, Language::English);
        assert_eq!(entries[1].language, Language::French);
        assert_eq!(entries[0].release_date.as_deref(), Some("2024-01-05"));
    }

    #[test]
    fn test_column_aliases_and_order() {
        let raw = StaticCatalogSource::new("Language,Data_ID,Title\nfr,10-10-0001-01,Titre\n")
            .fetch_catalog()
            .unwrap();
        let entries = parse_entries(&raw).unwrap();
        assert_eq!(entries[0].title, "Titre");
        assert_eq!(entries[0].description, "");
        assert_eq!(entries[0].release_date, None);
    }

    #[test]
    fn test_missing_required_column() {
        let raw = StaticCatalogSource::new("name,lang\nfoo,en\n").fetch_catalog().unwrap();
        match parse_entries(&raw) {
            Err(StatCanError::MalformedCatalog { reason }) => assert!(reason.contains("'id'")),
            other => panic!("Expected MalformedCatalog, got {:?}", other),
        }
    }

    #[test]
    fn test_http_source_failures() {
        let transport = MemoryTransport::new()
            .with_body("http://catalog/html", b"<html>maintenance</html>".to_vec())
            .with_body("http://catalog/ragged", b"id,title\na,b,c\n".to_vec());

        let missing = HttpCatalogSource::new("http://catalog/missing", &transport);
        assert!(matches!(
            missing.fetch_catalog(),
            Err(StatCanError::SourceUnavailable { .. })
        ));

        let html = HttpCatalogSource::new("http://catalog/html", &transport);
        assert!(matches!(
            html.fetch_catalog(),
            Err(StatCanError::SourceUnavailable { .. })
        ));

        let ragged = HttpCatalogSource::new("http://catalog/ragged", &transport);
        assert!(matches!(
            ragged.fetch_catalog(),
            Err(StatCanError::MalformedCatalog { .. })
        ));
    }
}
