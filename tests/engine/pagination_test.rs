#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{engine, engine_with, json, list, select, store, texts};
use hydrate::{
    AllowAll, Caller, EngineSettings, Page, QueryEngine, QueryRequest, RequestContext,
};
use serde_json::json;

fn streets(engine: &QueryEngine, page: Option<u64>, per_page: Option<u64>) -> Vec<String> {
    let mut request = QueryRequest::new("houses", select("street"));
    request.page = page;
    request.per_page = per_page;
    texts(&list(engine, &Caller::anonymous(), &request).unwrap(), "street")
}

fn small_pages() -> QueryEngine {
    engine_with(
        Arc::new(AllowAll),
        EngineSettings {
            max_per_page: 4,
            ..EngineSettings::default()
        },
    )
}

fn page(request: &QueryRequest) -> Page {
    engine()
        .fetch_page(&store(), &Caller::anonymous(), request, &RequestContext::new())
        .unwrap()
}

#[test]
fn test_page_windows() {
    let engine = engine();
    assert_eq!(streets(&engine, Some(1), Some(2)), ["street1", "street2"]);
    assert_eq!(streets(&engine, Some(2), Some(2)), ["Street3", "street4"]);
    assert_eq!(streets(&engine, Some(3), Some(2)), ["street42", "street5"]);
    assert!(streets(&engine, Some(4), Some(2)).is_empty());
}

#[test]
fn test_page_zero_is_first_page() {
    let engine = engine();
    assert_eq!(streets(&engine, Some(0), Some(2)), streets(&engine, Some(1), Some(2)));
    assert_eq!(streets(&engine, None, Some(2)), ["street1", "street2"]);
}

#[test]
fn test_per_page_is_clamped() {
    let engine = small_pages();
    assert_eq!(streets(&engine, None, None).len(), 4);
    assert_eq!(streets(&engine, None, Some(10)).len(), 4);
    assert_eq!(streets(&engine, None, Some(0)), ["street1"]);
    assert_eq!(streets(&engine, Some(2), Some(10)), ["street42", "street5"]);
}

#[test]
fn test_pages_follow_order() {
    let request = QueryRequest::new("houses", select("street"))
        .order("number DESC")
        .page(2)
        .per_page(4);
    let nodes = list(&engine(), &Caller::anonymous(), &request).unwrap();
    assert_eq!(texts(&nodes, "street"), ["street2", "street1"]);
}

#[test]
fn test_fetch_page_counts_all_matches() {
    let request = QueryRequest::new("houses", select("street")).page(2).per_page(2);
    assert_eq!(
        json(&page(&request)),
        json!({
            "total_count": 6,
            "page": 2,
            "per_page": 2,
            "data": [{"street": "Street3"}, {"street": "street4"}],
        })
    );

    let filtered = QueryRequest::new("houses", select("street"))
        .filter("number < 5")
        .per_page(1);
    let result = page(&filtered);
    assert_eq!(result.total_count, 4);
    assert_eq!(result.data.len(), 1);
}

#[test]
fn test_fetch_page_counts_distinct_roots() {
    let request = QueryRequest::new("users", select("name")).filter("houses.number > 0");
    let result = page(&request);
    assert_eq!(result.total_count, 3);
    assert_eq!(texts(&result.data, "name"), ["Ann", "Bob", "Cat"]);
}

#[test]
fn test_fetch_page_past_the_end() {
    let result = page(&QueryRequest::new("houses", select("street")).page(9).per_page(5));
    assert_eq!(result.total_count, 6);
    assert_eq!(result.page, 9);
    assert!(result.data.is_empty());
}

#[test]
fn test_far_pages_are_empty() {
    let engine = engine();
    assert!(streets(&engine, Some(u64::MAX / 2), Some(1000)).is_empty());
    assert!(streets(&engine, Some(20_000_000_000_000_000), None).is_empty());
    assert!(streets(&engine, Some(u64::MAX), Some(1)).is_empty());

    let result = page(&QueryRequest::new("houses", select("street")).page(u64::MAX / 2));
    assert_eq!(result.total_count, 6);
    assert!(result.data.is_empty());
}

#[test]
fn test_fetch_page_reports_clamped_bounds() {
    let result = small_pages()
        .fetch_page(
            &store(),
            &Caller::anonymous(),
            &QueryRequest::new("houses", select("street")).page(0).per_page(50),
            &RequestContext::new(),
        )
        .unwrap();
    assert_eq!((result.page, result.per_page), (1, 4));
    assert_eq!(result.data.len(), 4);
}
