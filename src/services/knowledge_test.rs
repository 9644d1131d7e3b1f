use reqwest::Method;
use serde_json::json;

use super::*;
use crate::test_helpers::{StubTransport, client_with};

#[tokio::test]
async fn search_sends_trimmed_query_parameter() {
    let stub = StubTransport::new();
    stub.respond(
        Method::GET,
        "/knowledge/search",
        200,
        json!([{ "_id": "k1", "title": "Scope 3 basics", "tags": ["scope3"] }]),
    );
    let results = KnowledgeService::new(client_with(stub.clone()))
        .search("  scope 3 ")
        .await
        .unwrap();

    assert_eq!(results[0].tags, vec!["scope3".to_owned()]);
    let sent = stub.last_request();
    assert_eq!(sent.query, vec![("q".to_owned(), "scope 3".to_owned())]);
}

#[tokio::test]
async fn get_unknown_article_is_not_found() {
    let stub = StubTransport::new();
    let err = KnowledgeService::new(client_with(stub))
        .get("missing")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}
