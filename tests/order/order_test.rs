#[path = "../common/mod.rs"]
mod common;

use common::{engine, list, ordered_streets, select, texts, ALL_STREETS};
use hydrate::{Caller, ErrorKind, QueryRequest};

fn streets(order: &str) -> Vec<String> {
    ordered_streets(order).unwrap_or_else(|e| panic!("order `{order}` failed: {e}"))
}

#[test]
fn test_street_ascending() {
    assert_eq!(
        streets("street ASC"),
        ["street1", "street2", "Street3", "street4", "street42", "street5"]
    );
}

#[test]
fn test_street_descending() {
    assert_eq!(
        streets("street DESC"),
        ["street5", "street42", "street4", "Street3", "street2", "street1"]
    );
}

#[test]
fn test_direction_defaults_to_ascending() {
    assert_eq!(streets("street"), streets("street ASC"));
    assert_eq!(streets("street asc"), streets("street ASC"));
    assert_eq!(streets("street desc"), streets("street DESC"));
}

#[test]
fn test_no_order_is_primary_key_order() {
    assert_eq!(streets(""), ALL_STREETS);
}

#[test]
fn test_numeric_order() {
    assert_eq!(
        streets("number DESC"),
        ["street42", "street5", "street4", "Street3", "street2", "street1"]
    );
    assert_eq!(
        streets("number"),
        ["street1", "street2", "Street3", "street4", "street5", "street42"]
    );
}

#[test]
fn test_multiple_terms() {
    assert_eq!(
        streets("is_rented DESC, number DESC"),
        ["street42", "street1", "street5", "Street3", "street2", "street4"]
    );
}

#[test]
fn test_to_one_relation_order() {
    // houses without an owner are kept and sort after owned ones
    assert_eq!(
        streets("user.email DESC, street"),
        ["street5", "Street3", "street4", "street1", "street2", "street42"]
    );
}

#[test]
fn test_to_many_relation_order() {
    let request = QueryRequest::new("users", select("name")).order("houses.number DESC");
    let nodes = list(&engine(), &Caller::anonymous(), &request).unwrap();
    assert_eq!(texts(&nodes, "name"), ["Cat", "Bob", "Ann"]);

    let request = QueryRequest::new("users", select("name")).order("accounts.balance ASC");
    let nodes = list(&engine(), &Caller::anonymous(), &request).unwrap();
    // Bob has no account: a null key sorts first ascending
    assert_eq!(texts(&nodes, "name"), ["Bob", "Cat", "Ann"]);
}

#[test]
fn test_order_with_filter() {
    let request = QueryRequest::new("houses", select("street"))
        .filter("number < 5")
        .order("street DESC");
    let nodes = list(&engine(), &Caller::anonymous(), &request).unwrap();
    assert_eq!(texts(&nodes, "street"), ["street4", "Street3", "street2", "street1"]);
}

#[test]
fn test_invalid_orders() {
    for spec in ["street UP", "nope ASC", "owner.email DESC", "street ASC DESC"] {
        let err = ordered_streets(spec).expect_err(spec);
        assert_eq!(err.kind(), ErrorKind::Order, "{spec}");
    }
}
