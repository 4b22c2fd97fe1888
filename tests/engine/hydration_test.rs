#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{engine, json, list, select, store, STREET1, STREET2, STREET3, STREET4, STREET5};
use hydrate::{
    Caller, EngineError, ErrorKind, Hydrated, QueryRequest, RequestContext, Selection, Store,
};
use serde_json::json;

fn listed(request: &QueryRequest) -> serde_json::Value {
    json(&list(&engine(), &Caller::anonymous(), request).unwrap())
}

fn fetched(request: &QueryRequest) -> Result<serde_json::Value, EngineError> {
    let result = engine().execute(&store(), &Caller::anonymous(), request, &RequestContext::new())?;
    match result {
        Hydrated::One(node) => Ok(json(&node)),
        Hydrated::Many(_) => panic!("expected a single record"),
    }
}

#[test]
fn test_nested_to_one_selection() {
    let request = QueryRequest::new("houses", select("street user { name city { name } }"))
        .filter("number <= 2");
    assert_eq!(
        listed(&request),
        json!([
            {"street": "street1", "user": {"name": "Ann", "city": {"name": "Paris"}}},
            {"street": "street2", "user": {"name": "Ann", "city": {"name": "Paris"}}},
        ])
    );
}

#[test]
fn test_missing_to_one_is_null() {
    let request =
        QueryRequest::new("houses", select("street user { name }")).filter("street === 'street42'");
    assert_eq!(listed(&request), json!([{"street": "street42", "user": null}]));
}

#[test]
fn test_to_many_selection() {
    let request = QueryRequest::new(
        "users",
        select("name houses { street } accounts { name balance }"),
    );
    assert_eq!(
        listed(&request),
        json!([
            {
                "name": "Ann",
                "houses": [{"street": "street1"}, {"street": "street2"}],
                "accounts": [
                    {"name": "checking", "balance": 120.5},
                    {"name": "savings", "balance": 5000.0},
                ],
            },
            {
                "name": "Bob",
                "houses": [{"street": "Street3"}, {"street": "street4"}],
                "accounts": [],
            },
            {
                "name": "Cat",
                "houses": [{"street": "street5"}],
                "accounts": [{"name": "checking", "balance": 0.0}],
            },
        ])
    );
}

#[test]
fn test_has_many_through_foreign_key_on_child() {
    let request = QueryRequest::new("cities", select("name users { name }"));
    assert_eq!(
        listed(&request),
        json!([
            {"name": "Paris", "users": [{"name": "Ann"}]},
            {"name": "Lyon", "users": [{"name": "Bob"}]},
        ])
    );
}

#[test]
fn test_relation_ids() {
    let request = QueryRequest::new("users", select("name house_ids account_ids"));
    assert_eq!(
        listed(&request),
        json!([
            {"name": "Ann", "house_ids": [STREET1, STREET2], "account_ids": [1, 2]},
            {"name": "Bob", "house_ids": [STREET3, STREET4], "account_ids": []},
            {"name": "Cat", "house_ids": [STREET5], "account_ids": [3]},
        ])
    );
}

#[test]
fn test_scalar_types() {
    let request = QueryRequest::new(
        "houses",
        select("street number price is_rented build_at sold_on description energy_grade"),
    )
    .filter("number == 1 || number == 4");
    assert_eq!(
        listed(&request),
        json!([
            {
                "street": "street1",
                "number": 1,
                "price": 100000.0,
                "is_rented": true,
                "build_at": "2020-01-15 10:00:00",
                "sold_on": "2021-03-01",
                "description": "corner house",
                "energy_grade": "a",
            },
            {
                "street": "street4",
                "number": 4,
                "price": null,
                "is_rented": null,
                "build_at": null,
                "sold_on": null,
                "description": null,
                "energy_grade": null,
            },
        ])
    );
}

#[test]
fn test_keys_follow_selection_order() {
    let request = QueryRequest::new("houses", select("number user { email } street id"))
        .filter("number == 3");
    let nodes = list(&engine(), &Caller::anonymous(), &request).unwrap();
    assert_eq!(nodes[0].keys().collect::<Vec<_>>(), ["number", "user", "street", "id"]);
}

#[test]
fn test_unknown_selection_keys_are_skipped() {
    let request = QueryRequest::new("houses", select("street nope")).filter("number == 3");
    assert_eq!(listed(&request), json!([{"street": "Street3"}]));
}

#[test]
fn test_json_selection() {
    let selection = Selection::from_json(&json!(["street", {"user": ["email"]}])).unwrap();
    let request = QueryRequest::new("houses", selection).filter("number == 3");
    assert_eq!(
        listed(&request),
        json!([{"street": "Street3", "user": {"email": "bob@example.com"}}])
    );
}

#[test]
fn test_single_fetch() {
    let request = QueryRequest::new("houses", select("street user { email }")).id(STREET3);
    assert_eq!(
        fetched(&request).unwrap(),
        json!({"street": "Street3", "user": {"email": "bob@example.com"}})
    );

    let request = QueryRequest::new("users", select("name house_ids")).id("2");
    assert_eq!(
        fetched(&request).unwrap(),
        json!({"name": "Bob", "house_ids": [STREET3, STREET4]})
    );
}

#[test]
fn test_single_fetch_accepts_any_uuid_spelling() {
    let spellings = [
        STREET3.replace('-', ""),
        format!("{{{STREET3}}}"),
        format!("urn:uuid:{STREET3}"),
        format!(" {STREET3} "),
    ];
    for id in spellings {
        let request = QueryRequest::new("houses", select("street")).id(id.as_str());
        assert_eq!(fetched(&request).unwrap(), json!({"street": "Street3"}), "id {id:?}");
    }
}

#[test]
fn test_bare_relation_key_yields_identifier() {
    let request = QueryRequest::new("houses", select("street user")).id(STREET1);
    assert_eq!(
        fetched(&request).unwrap(),
        json!({"street": "street1", "user": {"id": 1}})
    );
}

#[test]
fn test_single_fetch_not_found() {
    let missing = "00000000-0000-4000-8000-000000000099";
    let err = fetched(&QueryRequest::new("houses", select("street")).id(missing)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), format!("houses '{missing}' not found"));

    // excluded by the filter
    let request = QueryRequest::new("houses", select("street"))
        .id(STREET1)
        .filter("number > 1");
    assert_eq!(fetched(&request).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_single_fetch_invalid_id() {
    let err = fetched(&QueryRequest::new("houses", select("street")).id("42")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidId);

    let err = fetched(&QueryRequest::new("users", select("name")).id("ann")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidId);
}

#[test]
fn test_unknown_entity() {
    let err = list(&engine(), &Caller::anonymous(), &QueryRequest::new("boats", select("id")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownEntity);
    assert_eq!(
        json(&err.to_user_error()),
        json!({"kind": "unknown_entity", "message": "Unknown entity: boats"})
    );
}

#[test]
fn test_cancelled_request() {
    let ctx = RequestContext::new();
    ctx.cancel();
    let request = QueryRequest::new("houses", select("street"));
    let err = engine()
        .execute(&store(), &Caller::anonymous(), &request, &ctx)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn test_execute_async() {
    let engine = Arc::new(engine());
    let store: Arc<dyn Store> = Arc::new(store());
    let request = QueryRequest::new("houses", select("street")).order("street DESC");

    let result = engine
        .execute_async(store, Caller::anonymous(), request, Duration::from_secs(5))
        .await
        .unwrap();
    match result {
        Hydrated::Many(nodes) => {
            assert_eq!(nodes.len(), 6);
            assert_eq!(common::texts(&nodes[..1], "street"), ["street5"]);
        }
        Hydrated::One(_) => panic!("expected a list"),
    }
}

#[tokio::test]
async fn test_execute_async_times_out() {
    let engine = Arc::new(engine());
    let store: Arc<dyn Store> = Arc::new(store());
    let request = QueryRequest::new("houses", select("street user { email }"));

    let err = engine
        .execute_async(store, Caller::anonymous(), request, Duration::ZERO)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}
