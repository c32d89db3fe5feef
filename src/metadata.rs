//! In-memory searchable catalog.
//!
//! [`MetadataDatabase`] owns one catalog snapshot and a per-locale inverted
//! index from lowercased token to entry positions. Queries are conjunctive:
//! an entry matches when its title and description together contain every
//! keyword token. Results keep catalog order.

use crate::catalog::{self, CatalogSource, HttpCatalogSource};
use crate::constants::columns;
use crate::error::{Result, StatCanError};
use crate::models::{CatalogEntry, Column, ColumnData, Language, Table};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Split text into lowercased alphanumeric tokens
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
}

/// Token index over the entries of one locale
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    postings: HashMap<String, BTreeSet<usize>>,
    positions: BTreeSet<usize>,
}

impl MetadataIndex {
    fn insert(&mut self, position: usize, entry: &CatalogEntry) {
        self.positions.insert(position);
        for token in tokenize(&entry.title).chain(tokenize(&entry.description)) {
            self.postings.entry(token).or_default().insert(position);
        }
    }

    /// Positions whose token set is a superset of `tokens`
    pub fn matching(&self, tokens: &[String]) -> BTreeSet<usize> {
        if tokens.is_empty() {
            return self.positions.clone();
        }

        let mut postings = Vec::with_capacity(tokens.len());
        for token in tokens {
            match self.postings.get(token) {
                Some(set) => postings.push(set),
                None => return BTreeSet::new(),
            }
        }
        postings.sort_by_key(|set| set.len());

        let Some((smallest, rest)) = postings.split_first() else {
            return BTreeSet::new();
        };
        smallest
            .iter()
            .filter(|position| rest.iter().all(|set| set.contains(*position)))
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.postings.len()
    }
}

#[derive(Debug, Clone)]
struct CatalogSnapshot {
    entries: Vec<CatalogEntry>,
    indexes: HashMap<Language, MetadataIndex>,
}

impl CatalogSnapshot {
    fn build(entries: Vec<CatalogEntry>) -> Self {
        let mut indexes: HashMap<Language, MetadataIndex> = Language::ALL
            .iter()
            .map(|&language| (language, MetadataIndex::default()))
            .collect();
        for (position, entry) in entries.iter().enumerate() {
            indexes
                .entry(entry.language)
                .or_default()
                .insert(position, entry);
        }
        Self { entries, indexes }
    }
}

/// Searchable catalog
///
/// Not safe for a reload to overlap readers; `load` takes `&mut self` so a
/// shared instance needs an external `RwLock`.
#[derive(Debug)]
pub struct MetadataDatabase<S: CatalogSource = HttpCatalogSource> {
    source: S,
    snapshot: Option<CatalogSnapshot>,
}

impl<S: CatalogSource> MetadataDatabase<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            snapshot: None,
        }
    }

    /// Fetch the catalog and rebuild the index
    ///
    /// On failure the previously loaded snapshot, if any, stays in place.
    pub fn load(&mut self) -> Result<()> {
        let raw = self.source.fetch_catalog()?;
        let entries = catalog::parse_entries(&raw)?;
        let snapshot = CatalogSnapshot::build(entries);

        for language in Language::ALL {
            if let Some(index) = snapshot.indexes.get(&language) {
                debug!(
                    "Indexed {} {} entries over {} tokens",
                    index.len(),
                    language,
                    index.token_count()
                );
            }
        }
        info!("Loaded {} catalog entries", snapshot.entries.len());

        self.snapshot = Some(snapshot);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn entries(&self) -> Result<&[CatalogEntry]> {
        self.snapshot
            .as_ref()
            .map(|s| s.entries.as_slice())
            .ok_or(StatCanError::NotLoaded)
    }

    pub fn len(&self) -> usize {
        self.snapshot.as_ref().map_or(0, |s| s.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries matching every keyword token, in catalog order
    ///
    /// `None` searches all locales. No keywords (or keywords without any
    /// alphanumeric token) match everything in scope.
    pub fn search_entries(
        &self,
        keywords: &[&str],
        locale: Option<Language>,
    ) -> Result<Vec<&CatalogEntry>> {
        let snapshot = self.snapshot.as_ref().ok_or(StatCanError::NotLoaded)?;

        let mut tokens: Vec<String> = keywords.iter().flat_map(|k| tokenize(k)).collect();
        tokens.sort();
        tokens.dedup();

        let locales = match locale {
            Some(language) => vec![language],
            None => Language::ALL.to_vec(),
        };

        let mut positions = BTreeSet::new();
        for language in locales {
            if let Some(index) = snapshot.indexes.get(&language) {
                positions.extend(index.matching(&tokens));
            }
        }

        debug!(
            "Search {:?} ({}) matched {} entries",
            tokens,
            locale.map_or_else(|| "all".to_string(), |l| l.to_string()),
            positions.len()
        );
        Ok(positions.into_iter().map(|p| &snapshot.entries[p]).collect())
    }

    /// Matching entries as a table of title, id, description, release_date, lang
    pub fn search(&self, keywords: &[&str], locale: Option<Language>) -> Result<Table> {
        Ok(entries_to_table(self.search_entries(keywords, locale)?))
    }

    /// Like [`search`](Self::search) with the locale given as a code
    pub fn search_str(&self, keywords: &[&str], locale: &str) -> Result<Table> {
        let language = locale.parse::<Language>()?;
        self.search(keywords, Some(language))
    }
}

impl MetadataDatabase<HttpCatalogSource> {
    /// Database backed by the configured catalog URL
    pub fn from_config(config: &crate::config::StatCanConfig) -> Result<Self> {
        Ok(Self::new(HttpCatalogSource::from_config(config)?))
    }
}

fn entries_to_table(entries: Vec<&CatalogEntry>) -> Table {
    let mut title = Vec::with_capacity(entries.len());
    let mut id = Vec::with_capacity(entries.len());
    let mut description = Vec::with_capacity(entries.len());
    let mut release_date = Vec::with_capacity(entries.len());
    let mut lang = Vec::with_capacity(entries.len());

    for entry in entries {
        title.push(Some(entry.title.clone()));
        id.push(Some(entry.id.clone()));
        description.push(Some(entry.description.clone()).filter(|d| !d.is_empty()));
        release_date.push(entry.release_date.clone());
        lang.push(Some(entry.language.code().to_string()));
    }

    let data = [title, id, description, release_date, lang];
    Table::new(
        columns::CATALOG
            .iter()
            .zip(data)
            .map(|(name, values)| Column::new(*name, ColumnData::Text(values)))
            .collect(),
    )
}
