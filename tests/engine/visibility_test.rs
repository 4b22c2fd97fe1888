#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{
    engine_with, json, list, owner_visibility, schema, select, store, texts, ALL_STREETS, STREET1,
    STREET3,
};
use hydrate::config::Settings;
use hydrate::schema::Entity;
use hydrate::sql::{lit_bool, table_col, ExprExt};
use hydrate::{
    Caller, EngineSettings, ErrorKind, QueryEngine, QueryRequest, RequestContext, Scope,
    VisibilityProvider,
};
use serde_json::json;

fn owners() -> QueryEngine {
    engine_with(owner_visibility(), EngineSettings::default())
}

/// Users see only themselves; accounts are hidden unless auditing.
fn private_users() -> QueryEngine {
    let settings = Settings::from_toml(
        r#"
        [visibility.users]
        owner_column = "id"

        [visibility.accounts]
        deny = true
        bypass_roles = ["auditor"]
        "#,
    )
    .unwrap();
    let visibility = settings.visibility(&schema()).unwrap();
    engine_with(Arc::new(visibility), EngineSettings::default())
}

fn house_streets(engine: &QueryEngine, caller: &Caller) -> Vec<String> {
    let request = QueryRequest::new("houses", select("street"));
    texts(&list(engine, caller, &request).unwrap(), "street")
}

#[test]
fn test_root_scope() {
    let engine = owners();
    assert_eq!(house_streets(&engine, &Caller::user("1")), ["street1", "street2"]);
    assert_eq!(house_streets(&engine, &Caller::user("2")), ["Street3", "street4"]);
    assert!(house_streets(&engine, &Caller::anonymous()).is_empty());
    assert!(house_streets(&engine, &Caller::user("ann")).is_empty());
}

#[test]
fn test_bypass_role_sees_everything() {
    let engine = owners();
    assert_eq!(
        house_streets(&engine, &Caller::anonymous().with_role("admin")),
        ALL_STREETS
    );
    assert_eq!(
        house_streets(&engine, &Caller::user("1").with_role("admin")),
        ALL_STREETS
    );
}

#[test]
fn test_filter_cannot_widen_scope() {
    let request = QueryRequest::new("houses", select("street")).filter("user.name == 'Bob'");
    let nodes = list(&owners(), &Caller::user("1"), &request).unwrap();
    assert!(nodes.is_empty());
}

#[test]
fn test_nested_relations_are_scoped() {
    let request = QueryRequest::new("users", select("name houses { street } house_ids"));
    let nodes = list(&owners(), &Caller::user("2"), &request).unwrap();
    assert_eq!(
        json(&nodes),
        json!([
            {"name": "Ann", "houses": [], "house_ids": []},
            {"name": "Bob", "houses": [{"street": "Street3"}, {"street": "street4"}],
             "house_ids": [STREET3, "00000000-0000-4000-8000-000000000004"]},
            {"name": "Cat", "houses": [], "house_ids": []},
        ])
    );
}

#[test]
fn test_hidden_to_one_is_null() {
    let request = QueryRequest::new("houses", select("street user { name }")).filter("number < 4");
    let nodes = list(&private_users(), &Caller::user("1"), &request).unwrap();
    assert_eq!(
        json(&nodes),
        json!([
            {"street": "street1", "user": {"name": "Ann"}},
            {"street": "street2", "user": {"name": "Ann"}},
            {"street": "Street3", "user": null},
        ])
    );
}

#[test]
fn test_denied_relation_is_empty() {
    let engine = private_users();
    let request = QueryRequest::new("users", select("name accounts { name } account_ids"));

    let nodes = list(&engine, &Caller::user("1"), &request).unwrap();
    assert_eq!(
        json(&nodes),
        json!([{"name": "Ann", "accounts": [], "account_ids": []}])
    );

    let nodes = list(&engine, &Caller::user("1").with_role("auditor"), &request).unwrap();
    assert_eq!(
        json(&nodes),
        json!([{
            "name": "Ann",
            "accounts": [{"name": "checking"}, {"name": "savings"}],
            "account_ids": [1, 2],
        }])
    );
}

#[test]
fn test_filter_joins_are_scoped() {
    let engine = owners();
    let request = QueryRequest::new("users", select("name")).filter("houses.number > 0");

    let names = |caller: &Caller| texts(&list(&engine, caller, &request).unwrap(), "name");
    assert_eq!(names(&Caller::user("1")), ["Ann"]);
    assert_eq!(names(&Caller::user("2")), ["Bob"]);
    assert_eq!(names(&Caller::anonymous().with_role("admin")), ["Ann", "Bob", "Cat"]);
}

#[test]
fn test_order_joins_are_scoped() {
    let engine = owners();
    let request = QueryRequest::new("users", select("name")).order("houses.number DESC");

    let names = |caller: &Caller| texts(&list(&engine, caller, &request).unwrap(), "name");
    // invisible houses contribute no sort key
    assert_eq!(names(&Caller::user("1")), ["Ann", "Bob", "Cat"]);
    assert_eq!(names(&Caller::anonymous().with_role("admin")), ["Cat", "Bob", "Ann"]);
}

#[test]
fn test_single_fetch_outside_scope_is_not_allowed() {
    let engine = owners();
    let request = QueryRequest::new("houses", select("street")).id(STREET3);
    let fetch = |caller: &Caller| {
        engine.execute(&store(), caller, &request, &RequestContext::new())
    };

    let err = fetch(&Caller::user("1")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(
        json(&err.to_user_error()),
        json!({"kind": "authorization", "message": "403 - Not allowed"})
    );

    assert!(fetch(&Caller::user("2")).is_ok());
    assert!(fetch(&Caller::anonymous().with_role("admin")).is_ok());
}

#[test]
fn test_single_fetch_missing_is_not_found() {
    let engine = owners();
    let ctx = RequestContext::new();

    let missing = QueryRequest::new("houses", select("street")).id("00000000-0000-4000-8000-0000000000ff");
    let err = engine.execute(&store(), &Caller::user("1"), &missing, &ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let filtered = QueryRequest::new("houses", select("street"))
        .id(STREET1)
        .filter("number > 100");
    let err = engine.execute(&store(), &Caller::user("1"), &filtered, &ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_count_respects_scope() {
    let page = owners()
        .fetch_page(
            &store(),
            &Caller::user("1"),
            &QueryRequest::new("houses", select("street")),
            &RequestContext::new(),
        )
        .unwrap();
    assert_eq!(page.total_count, 2);
    assert_eq!(texts(&page.data, "street"), ["street1", "street2"]);
}

#[test]
fn test_custom_provider() {
    let rented_only = |entity: &Entity, alias: &str, _caller: &Caller| -> Scope {
        if entity.name == "houses" {
            Scope::Where(table_col(alias, "is_rented").eq(lit_bool(true)))
        } else {
            Scope::All
        }
    };
    let visibility: Arc<dyn VisibilityProvider> = Arc::new(rented_only);
    let engine = engine_with(visibility, EngineSettings::default());
    assert_eq!(house_streets(&engine, &Caller::anonymous()), ["street1", "street42"]);
}
