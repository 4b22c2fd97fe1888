#[path = "../common/mod.rs"]
mod common;

use common::{engine, filtered_streets, list, select, texts, ALL_STREETS};
use hydrate::{Caller, ErrorKind, QueryRequest};

fn streets(filter: &str) -> Vec<String> {
    filtered_streets(filter).unwrap_or_else(|e| panic!("filter `{filter}` failed: {e}"))
}

fn kind(filter: &str) -> ErrorKind {
    filtered_streets(filter)
        .expect_err("filter should be rejected")
        .kind()
}

#[test]
fn test_string_equality_ignores_case() {
    assert_eq!(streets("street == 'STREET42'"), ["street42"]);
    assert_eq!(streets("street == 'street3'"), ["Street3"]);
}

#[test]
fn test_strict_string_equality() {
    assert!(streets("street === 'STREET42'").is_empty());
    assert_eq!(streets("street === 'street42'"), ["street42"]);
    assert_eq!(streets("street === 'Street3'"), ["Street3"]);
}

#[test]
fn test_string_inequality() {
    assert_eq!(
        streets("street != 'STREET42'"),
        ["street1", "street2", "Street3", "street4", "street5"]
    );
    // differently cased value never matches exactly
    assert_eq!(streets("street !== 'STREET42'"), ALL_STREETS);
}

#[test]
fn test_integer_comparisons() {
    assert_eq!(streets("number == 42"), ["street42"]);
    assert_eq!(streets("number > 4"), ["street42", "street5"]);
    assert_eq!(streets("number >= 4"), ["street4", "street42", "street5"]);
    assert_eq!(streets("number < 2"), ["street1"]);
    assert_eq!(streets("number <= 2"), ["street1", "street2"]);
    assert_eq!(streets("number != 1").len(), 5);
}

#[test]
fn test_float_comparisons() {
    assert_eq!(streets("price > 150000"), ["street2", "Street3", "street42"]);
    assert_eq!(streets("price == 150000.5"), ["street2"]);
    assert_eq!(streets("price < 100000"), ["street5"]);
}

#[test]
fn test_datetime_comparisons() {
    assert_eq!(
        streets("build_at > '2020-06-01 08:30:00'"),
        ["Street3", "street42"]
    );
    assert_eq!(
        streets("build_at >= '2020-06-01 08:30:00'"),
        ["street2", "Street3", "street42"]
    );
    assert_eq!(streets("build_at < '2020-01-01 00:00:00'"), ["street5"]);
}

#[test]
fn test_date_comparisons() {
    assert_eq!(streets("sold_on == '2021-03-01'"), ["street1"]);
    assert_eq!(streets("sold_on > '2020-01-01'"), ["street1", "Street3"]);
}

#[test]
fn test_enum_labels() {
    assert_eq!(streets("energy_grade == 'a'"), ["street1"]);
    assert_eq!(streets("energy_grade == 'b'"), ["street2", "Street3"]);
    assert_eq!(
        streets("energy_grade != 'a'"),
        ["street2", "Street3", "street42", "street5"]
    );
}

#[test]
fn test_boolean_equality() {
    assert_eq!(streets("is_rented == true"), ["street1", "street42"]);
    assert_eq!(streets("is_rented == false"), ["street2", "Street3", "street5"]);
}

#[test]
fn test_null_partitions() {
    assert_eq!(streets("user_id == null"), ["street42"]);
    assert_eq!(streets("user_id != null").len(), 5);
    assert_eq!(streets("price == null"), ["street4"]);
    assert_eq!(streets("id != null"), ALL_STREETS);
    assert!(streets("id == null").is_empty());
}

#[test]
fn test_relation_field() {
    assert_eq!(streets("user.email == 'ann@example.com'"), ["street1", "street2"]);
    assert_eq!(streets("user.email == 'ANN@EXAMPLE.COM'"), ["street1", "street2"]);
    // houses without an owner never match a condition on the owner
    assert_eq!(
        streets("user.email != 'ann@example.com'"),
        ["Street3", "street4", "street5"]
    );
    assert_eq!(streets("user.name === 'Bob'"), ["Street3", "street4"]);
}

#[test]
fn test_relation_field_matches_missing_relation() {
    assert_eq!(streets("user.email == null"), ["street42"]);
    assert_eq!(streets("user.email != null").len(), 5);
    assert_eq!(streets("user.city_id == null"), ["street42", "street5"]);
}

#[test]
fn test_or_through_relation_keeps_unrelated_roots() {
    assert_eq!(
        streets("street == 'street42' || user.email == 'ann@example.com'"),
        ["street1", "street2", "street42"]
    );
    assert_eq!(
        streets("user.name == 'cat' || price > 400000"),
        ["street42", "street5"]
    );

    let request = QueryRequest::new("users", select("name"))
        .filter("name == 'Bob' || houses.number == 5");
    let nodes = list(&engine(), &Caller::anonymous(), &request).unwrap();
    assert_eq!(texts(&nodes, "name"), ["Bob", "Cat"]);
}

#[test]
fn test_to_many_relation_deduplicates_root() {
    let request = QueryRequest::new("users", select("name")).filter("houses.number > 0");
    let nodes = list(&engine(), &Caller::anonymous(), &request).unwrap();
    assert_eq!(texts(&nodes, "name"), ["Ann", "Bob", "Cat"]);

    let request = QueryRequest::new("users", select("name")).filter("houses.is_rented == true");
    let nodes = list(&engine(), &Caller::anonymous(), &request).unwrap();
    assert_eq!(texts(&nodes, "name"), ["Ann"]);
}

#[test]
fn test_and_or() {
    assert_eq!(streets("number > 1 && number < 4"), ["street2", "Street3"]);
    assert_eq!(
        streets("street == 'street1' || street == 'street5'"),
        ["street1", "street5"]
    );
    assert_eq!(
        streets("(number == 1 || number == 2) && is_rented == true"),
        ["street1"]
    );
    assert_eq!(
        streets("user.name == 'ann' && (price > 120000 || sold_on != null)"),
        ["street1", "street2"]
    );
}

#[test]
fn test_redundant_parens() {
    assert_eq!(streets("((number == 1))"), ["street1"]);
    assert_eq!(
        streets("(street == 'street1') || ((street == 'street2'))"),
        ["street1", "street2"]
    );
}

#[test]
fn test_blank_filter_returns_everything() {
    assert_eq!(streets(""), ALL_STREETS);
    assert_eq!(streets("   "), ALL_STREETS);
}

#[test]
fn test_syntax_errors() {
    assert_eq!(kind("street == "), ErrorKind::Parse);
    assert_eq!(kind("street = 'x'"), ErrorKind::Parse);
    assert_eq!(kind("street == 'x' number == 1"), ErrorKind::Parse);
    assert_eq!(kind("(number == 1"), ErrorKind::Parse);
}

#[test]
fn test_semantic_errors() {
    assert_eq!(kind("nope == 1"), ErrorKind::Filter);
    assert_eq!(kind("owner.email == 'x'"), ErrorKind::Filter);
    assert_eq!(kind("number == 'abc'"), ErrorKind::Filter);
    assert_eq!(kind("street > 'a'"), ErrorKind::Filter);
    assert_eq!(kind("energy_grade == 'z'"), ErrorKind::Filter);
    assert_eq!(kind("build_at > 'yesterday'"), ErrorKind::Filter);
    assert_eq!(kind("number > null"), ErrorKind::Filter);
}
