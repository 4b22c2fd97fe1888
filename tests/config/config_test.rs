#[path = "../common/mod.rs"]
mod common;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hydrate::config::{LogFormat, Settings, SettingsError};
use hydrate::schema::{FieldType, IdKind, RelationKind};
use hydrate::sql::Dialect;
use hydrate::{Caller, QueryEngine, QueryRequest, RequestContext, Selection};

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/hydrate.toml");

#[test]
fn test_sample_config_loads() {
    let settings = Settings::from_file(SAMPLE).unwrap();

    let engine = settings.engine.to_engine_settings().unwrap();
    assert_eq!(engine.max_per_page, 1000);
    assert_eq!(engine.dialect, Dialect::Sqlite);
    assert_eq!(engine.query_timeout, Duration::from_secs(5));
    assert_eq!(settings.logging.level, "info");
    assert_eq!(settings.logging.format, LogFormat::Pretty);
    assert!(settings.visibility.is_empty());
}

#[test]
fn test_sample_schema() {
    let schema = Settings::from_file(SAMPLE).unwrap().schema().unwrap();
    assert_eq!(schema.len(), 4);

    let houses = schema.entity("houses").unwrap();
    assert_eq!(houses.id_kind, IdKind::Uuid);
    assert_eq!(houses.primary_key, "id");
    let grade = houses.attribute("energy_grade").unwrap();
    match &grade.field_type {
        FieldType::Enum(mapping) => {
            assert_eq!(mapping.labels().collect::<Vec<_>>(), ["a", "b", "c", "d"]);
        }
        other => panic!("energy_grade is {other}"),
    }

    let user = houses.relation("user").unwrap();
    assert_eq!(user.kind, RelationKind::BelongsTo);
    assert_eq!(user.keys.source_column, "user_id");

    let residents = schema.entity("cities").unwrap().relation("users").unwrap();
    assert_eq!(residents.kind, RelationKind::HasMany);
    assert_eq!(residents.keys.target_column, "city_id");
}

#[test]
fn test_database_path_expansion() {
    env::set_var("HYDRATE_TEST_DATA_DIR", "/srv/hydrate");
    let settings = Settings::from_toml(
        r#"
        [database]
        path = "${HYDRATE_TEST_DATA_DIR}/houses.sqlite"
        "#,
    )
    .unwrap();
    assert_eq!(
        settings.database.resolved_path().unwrap(),
        Some(PathBuf::from("/srv/hydrate/houses.sqlite"))
    );

    let settings = Settings::from_toml(
        r#"
        [database]
        path = "${HYDRATE_TEST_UNSET_DIR}/houses.sqlite"
        "#,
    )
    .unwrap();
    assert!(matches!(
        settings.database.resolved_path(),
        Err(SettingsError::MissingEnvVar(name)) if name == "HYDRATE_TEST_UNSET_DIR"
    ));
}

#[test]
fn test_load_from_environment() {
    env::set_var("HYDRATE_CONFIG", SAMPLE);
    let settings = Settings::load().unwrap();
    assert_eq!(settings.entities.len(), 4);
}

#[test]
fn test_invalid_visibility_rules() {
    let schema = Settings::from_file(SAMPLE).unwrap().schema().unwrap();

    let unknown_column = Settings::from_toml(
        r#"
        [visibility.houses]
        owner_column = "owner_id"
        "#,
    )
    .unwrap();
    assert!(matches!(
        unknown_column.visibility(&schema),
        Err(SettingsError::Schema(_))
    ));

    let unknown_entity = Settings::from_toml(
        r#"
        [visibility.boats]
        deny = true
        "#,
    )
    .unwrap();
    assert!(matches!(
        unknown_entity.visibility(&schema),
        Err(SettingsError::Schema(_))
    ));
}

#[test]
fn test_invalid_documents() {
    assert!(matches!(
        Settings::from_toml("[engine\nmax_per_page = 3"),
        Err(SettingsError::ParseError(_))
    ));
    assert!(matches!(
        Settings::from_toml("[engine]\ndialect = \"oracle\""),
        Err(SettingsError::ParseError(_))
    ));

    let settings = Settings::from_toml("[engine]\nquery_timeout = \"soon\"").unwrap();
    assert!(matches!(
        settings.engine.to_engine_settings(),
        Err(SettingsError::InvalidDuration(_))
    ));
}

#[test]
fn test_engine_from_config() {
    let mut settings = Settings::from_file(SAMPLE).unwrap();
    let overrides = Settings::from_toml(
        r#"
        [engine]
        max_per_page = 3
        query_timeout = "250ms"

        [visibility.houses]
        owner_column = "user_id"
        bypass_roles = ["admin"]
        "#,
    )
    .unwrap();
    settings.engine = overrides.engine;
    settings.visibility = overrides.visibility;

    let schema = Arc::new(settings.schema().unwrap());
    let visibility = Arc::new(settings.visibility(&schema).unwrap());
    let engine_settings = settings.engine.to_engine_settings().unwrap();
    assert_eq!(engine_settings.query_timeout, Duration::from_millis(250));
    let engine = QueryEngine::new(schema, visibility, engine_settings);

    let request = QueryRequest::new("houses", Selection::parse("street").unwrap());
    let store = common::store();
    let ctx = RequestContext::new();

    let owned = engine.fetch_many(&store, &Caller::user("2"), &request, &ctx).unwrap();
    assert_eq!(common::texts(&owned, "street"), ["Street3", "street4"]);

    let admin = engine
        .fetch_many(&store, &Caller::anonymous().with_role("admin"), &request, &ctx)
        .unwrap();
    assert_eq!(admin.len(), 3);
}
