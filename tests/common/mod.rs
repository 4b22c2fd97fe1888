//! Shared fixture: the sample configuration's schema over an in-memory
//! SQLite database.
//!
//! ```text
//! cities   1 Paris, 2 Lyon
//! users    1 Ann (Paris), 2 Bob (Lyon), 3 Cat (no city)
//! houses   street1, street2 (Ann)  Street3, street4 (Bob)
//!          street42 (no owner)     street5 (Cat)
//! accounts checking, savings (Ann) checking (Cat)
//! ```
#![allow(dead_code)]

use std::sync::Arc;

use hydrate::config::Settings;
use hydrate::{
    AllowAll, Caller, EngineResult, EngineSettings, QueryEngine, QueryRequest, RequestContext,
    ResultNode, RuleVisibility, SchemaGraph, Selection, SqliteStore, Value, VisibilityProvider,
};

pub const STREET1: &str = "00000000-0000-4000-8000-000000000001";
pub const STREET2: &str = "00000000-0000-4000-8000-000000000002";
pub const STREET3: &str = "00000000-0000-4000-8000-000000000003";
pub const STREET4: &str = "00000000-0000-4000-8000-000000000004";
pub const STREET42: &str = "00000000-0000-4000-8000-000000000005";
pub const STREET5: &str = "00000000-0000-4000-8000-000000000006";

/// Every street, in primary key order.
pub const ALL_STREETS: [&str; 6] = ["street1", "street2", "Street3", "street4", "street42", "street5"];

const TABLES: &str = "
    CREATE TABLE cities (id INTEGER PRIMARY KEY, name TEXT);
    CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        email TEXT,
        name TEXT,
        city_id INTEGER REFERENCES cities (id)
    );
    CREATE TABLE houses (
        id TEXT PRIMARY KEY,
        street TEXT,
        number INTEGER,
        price REAL,
        is_rented INTEGER,
        build_at TEXT,
        sold_on TEXT,
        description TEXT,
        energy_grade INTEGER,
        user_id INTEGER REFERENCES users (id)
    );
    CREATE TABLE accounts (
        id INTEGER PRIMARY KEY,
        name TEXT,
        balance REAL,
        user_id INTEGER REFERENCES users (id)
    );
";

const ROWS: &str = "
    INSERT INTO cities VALUES (1, 'Paris'), (2, 'Lyon');
    INSERT INTO users VALUES
        (1, 'ann@example.com', 'Ann', 1),
        (2, 'bob@example.com', 'Bob', 2),
        (3, 'cat@example.com', 'Cat', NULL);
    INSERT INTO houses VALUES
        ('00000000-0000-4000-8000-000000000001', 'street1', 1, 100000.0, 1,
         '2020-01-15 10:00:00', '2021-03-01', 'corner house', 0, 1),
        ('00000000-0000-4000-8000-000000000002', 'street2', 2, 150000.5, 0,
         '2020-06-01 08:30:00', NULL, NULL, 1, 1),
        ('00000000-0000-4000-8000-000000000003', 'Street3', 3, 200000.0, 0,
         '2021-02-10 12:00:00', '2022-07-14', 'large garden', 1, 2),
        ('00000000-0000-4000-8000-000000000004', 'street4', 4, NULL, NULL,
         NULL, NULL, NULL, NULL, 2),
        ('00000000-0000-4000-8000-000000000005', 'street42', 42, 420000.0, 1,
         '2022-11-30 18:45:00', NULL, NULL, 2, NULL),
        ('00000000-0000-4000-8000-000000000006', 'street5', 5, 99999.99, 0,
         '2019-05-05 05:05:05', '2019-12-31', NULL, 3, 3);
    INSERT INTO accounts VALUES
        (1, 'checking', 120.5, 1),
        (2, 'savings', 5000.0, 1),
        (3, 'checking', 0.0, 3);
";

/// The repository's sample configuration.
pub fn settings() -> Settings {
    Settings::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/hydrate.toml"))
        .expect("sample config loads")
}

pub fn schema() -> Arc<SchemaGraph> {
    Arc::new(settings().schema().expect("sample schema is valid"))
}

pub fn store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().expect("in-memory database");
    store.execute_batch(TABLES).expect("create tables");
    store.execute_batch(ROWS).expect("insert rows");
    store
}

/// Engine where everything is visible.
pub fn engine() -> QueryEngine {
    engine_with(Arc::new(AllowAll), EngineSettings::default())
}

pub fn engine_with(
    visibility: Arc<dyn VisibilityProvider>,
    settings: EngineSettings,
) -> QueryEngine {
    QueryEngine::new(schema(), visibility, settings)
}

/// Houses visible to their owner, everything visible to admins.
pub fn owner_visibility() -> Arc<RuleVisibility> {
    let settings = Settings::from_toml(
        r#"
        [visibility.houses]
        owner_column = "user_id"
        bypass_roles = ["admin"]
        "#,
    )
    .expect("visibility section parses");
    Arc::new(settings.visibility(&schema()).expect("rules match schema"))
}

pub fn select(source: &str) -> Selection {
    Selection::parse(source).expect("selection parses")
}

/// List records as `caller`.
pub fn list(
    engine: &QueryEngine,
    caller: &Caller,
    request: &QueryRequest,
) -> EngineResult<Vec<ResultNode>> {
    engine.fetch_many(&store(), caller, request, &RequestContext::new())
}

/// Streets of the houses matching `filter`, in primary key order.
pub fn filtered_streets(filter: &str) -> EngineResult<Vec<String>> {
    let request = QueryRequest::new("houses", select("street")).filter(filter);
    list(&engine(), &Caller::anonymous(), &request).map(|nodes| texts(&nodes, "street"))
}

/// Streets of every house, ordered by `order`.
pub fn ordered_streets(order: &str) -> EngineResult<Vec<String>> {
    let request = QueryRequest::new("houses", select("street")).order(order);
    list(&engine(), &Caller::anonymous(), &request).map(|nodes| texts(&nodes, "street"))
}

/// The text value of `key` in each node; null becomes an empty string.
pub fn texts(nodes: &[ResultNode], key: &str) -> Vec<String> {
    nodes
        .iter()
        .map(|node| match node.scalar(key) {
            Some(Value::Text(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => panic!("{key} is not text: {other:?}"),
        })
        .collect()
}

pub fn json(value: &impl serde::Serialize) -> serde_json::Value {
    serde_json::to_value(value).expect("result serializes")
}
