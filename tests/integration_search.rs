//! Integration tests for catalog loading and keyword search
//!
//! The catalog is served from memory, either as static bytes or through the
//! in-memory transport behind the HTTP catalog adapter.

use statcan::catalog::{HttpCatalogSource, StaticCatalogSource};
use statcan::transport::{MemoryTransport, TransportError};
use statcan::{Backend, Cell, Language, MetadataDatabase, StatCanError, to_dataframe};

const CATALOG_URL: &str = "https://catalog.example.test/statcan_data.csv";

const CATALOG: &str = "\
title,id,description,release_date,lang
Labour force characteristics by province,34-10-0281-01,\"Monthly estimates of employment, unemployment\",2024-01-05,en
Caractéristiques de la population active par province,34-10-0281-01,\"Estimations mensuelles de l'emploi\",2024-01-05,fr
Consumer Price Index monthly,18-10-0004-01,Price changes for a basket of goods,2024-01-16,en
Indice des prix à la consommation,18-10-0004-01,Variation des prix d'un panier de biens,2024-01-16,fr
Labour productivity measures,36-10-0480-01,Productivity and labour costs,2023-12-01,en
";

fn loaded_database() -> MetadataDatabase<StaticCatalogSource> {
    let mut database = MetadataDatabase::new(StaticCatalogSource::new(CATALOG));
    database.load().expect("Catalog should load");
    database
}

fn ids(table: &statcan::Table) -> Vec<String> {
    let column = table.column("id").expect("search results have an id column");
    (0..table.height())
        .map(|row| column.data.cell(row).to_text())
        .collect()
}

/// Purpose: English search finds the labour force table, French search does not
#[test]
fn test_labour_force_scenario() {
    let database = loaded_database();

    let english = database
        .search(&["labour", "force"], Some(Language::English))
        .unwrap();
    assert_eq!(ids(&english), vec!["34-10-0281-01"]);

    let french = database
        .search(&["labour", "force"], Some(Language::French))
        .unwrap();
    assert_eq!(french.height(), 0);

    // Equivalent French tokens find the same table
    let french = database
        .search(&["population", "active"], Some(Language::French))
        .unwrap();
    assert_eq!(ids(&french), vec!["34-10-0281-01"]);
}

/// Purpose: no keywords lists the whole catalog in catalog order
#[test]
fn test_zero_keywords_returns_everything() {
    let database = loaded_database();
    let all = database.search(&[], None).unwrap();
    assert_eq!(all.height(), 5);
    assert_eq!(
        all.column_names(),
        vec!["title", "id", "description", "release_date", "lang"]
    );
    assert_eq!(
        ids(&all),
        vec![
            "34-10-0281-01",
            "34-10-0281-01",
            "18-10-0004-01",
            "18-10-0004-01",
            "36-10-0480-01"
        ]
    );

    let english = database.search(&[], Some(Language::English)).unwrap();
    assert_eq!(english.height(), 3);
}

/// Purpose: matching is conjunctive and case-insensitive, across title and description
#[test]
fn test_conjunctive_matching() {
    let database = loaded_database();

    let labour = database.search(&["LABOUR"], Some(Language::English)).unwrap();
    assert_eq!(ids(&labour), vec!["34-10-0281-01", "36-10-0480-01"]);

    let costs = database
        .search(&["labour", "costs"], Some(Language::English))
        .unwrap();
    assert_eq!(ids(&costs), vec!["36-10-0480-01"]);

    let nothing = database
        .search(&["labour", "basket"], Some(Language::English))
        .unwrap();
    assert_eq!(nothing.height(), 0);
}

/// Purpose: results go through the dataframe facade unchanged
#[test]
fn test_results_as_dataframe() {
    let database = loaded_database();
    let results = database.search(&["prix"], None).unwrap();
    let frame = to_dataframe(&results, Backend::Native).unwrap();

    assert_eq!(frame.height(), 1);
    let lang = frame.column("lang").unwrap().unwrap();
    assert_eq!(lang, vec![Cell::Text("fr".to_string())]);
}

/// Purpose: searching before load is an error, not an empty result
#[test]
fn test_search_requires_load() {
    let database = MetadataDatabase::new(StaticCatalogSource::new(CATALOG));
    assert!(matches!(
        database.search(&["labour"], None),
        Err(StatCanError::NotLoaded)
    ));
}

/// Purpose: the HTTP adapter maps transport failures to SourceUnavailable
#[test]
fn test_catalog_over_transport() {
    let transport = MemoryTransport::new().with_body(CATALOG_URL, CATALOG);
    let mut database = MetadataDatabase::new(HttpCatalogSource::new(CATALOG_URL, transport));
    database.load().unwrap();
    assert_eq!(database.len(), 5);

    let failing = MemoryTransport::new()
        .with_failure(CATALOG_URL, TransportError::Failed("HTTP 502".to_string()));
    let mut database = MetadataDatabase::new(HttpCatalogSource::new(CATALOG_URL, failing));
    assert!(matches!(
        database.load(),
        Err(StatCanError::SourceUnavailable { .. })
    ));
    assert!(!database.is_loaded());
}

/// Purpose: a feed without the required columns is a malformed catalog
#[test]
fn test_malformed_catalog() {
    let mut database = MetadataDatabase::new(StaticCatalogSource::new("name,size\nfoo,1\n"));
    assert!(matches!(
        database.load(),
        Err(StatCanError::MalformedCatalog { .. })
    ));
}
