use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use xuezi::api::router;
use xuezi::catalog::{Catalog, CatalogEntry};
use xuezi::db::SqliteStore;
use xuezi::suggest::Suggester;
use xuezi::AppState;

fn two_word_catalog() -> Catalog {
    Catalog::from_entries(vec![
        CatalogEntry::new("爱", "ài", "love"),
        CatalogEntry::new("八", "bā", "eight"),
    ])
    .unwrap()
}

fn test_state_with(catalog: Catalog, api_key: Option<&str>) -> AppState {
    let store = SqliteStore::open(":memory:").unwrap();
    AppState::new(Arc::new(store), Suggester::new(Arc::new(catalog), Some(5)))
        .with_api_key(api_key.map(|s| s.to_string()))
}

fn test_state(api_key: Option<&str>) -> AppState {
    test_state_with(two_word_catalog(), api_key)
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_req(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn req(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        b = b.header("authorization", format!("Bearer {t}"));
    }
    b.body(Body::empty()).unwrap()
}

fn get_req(uri: &str) -> Request<Body> {
    req("GET", uri, None)
}

/// Percent-encode a path segment (enough for CJK text).
fn encode(s: &str) -> String {
    s.bytes().map(|b| format!("%{b:02X}")).collect()
}

async fn add(state: &AppState, body: serde_json::Value) -> serde_json::Value {
    let resp = router(state.clone())
        .oneshot(json_req("POST", "/add", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- Status ---

#[tokio::test]
async fn index_reports_running() {
    let resp = router(test_state(None)).oneshot(get_req("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["message"], "Chinese Learning API is running!");
    assert_eq!(j["name"], "xuezi");
}

#[tokio::test]
async fn stats_counts_known_and_remaining() {
    let state = test_state(None);
    add(&state, serde_json::json!({"character": "爱"})).await;
    add(&state, serde_json::json!({"character": "猫"})).await;

    let resp = router(state).oneshot(get_req("/stats")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["known"], 2);
    assert_eq!(j["catalog"], 2);
    assert_eq!(j["remaining"], 1);
}

// --- Auth ---

#[tokio::test]
async fn auth_rejects_no_token() {
    let app = router(test_state(Some("secret123")));
    let resp = app.oneshot(get_req("/characters")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_rejects_wrong_token() {
    let app = router(test_state(Some("secret123")));
    let resp = app
        .oneshot(req("GET", "/characters", Some("nope")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_passes_correct_token() {
    let app = router(test_state(Some("secret123")));
    let resp = app
        .oneshot(req("GET", "/characters", Some("secret123")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_needs_no_auth() {
    let app = router(test_state(Some("secret123")));
    let resp = app.oneshot(get_req("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_api_key_disables_auth() {
    let app = router(test_state(Some("")));
    let resp = app.oneshot(get_req("/characters")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- Add ---

#[tokio::test]
async fn add_returns_201_with_record() {
    let state = test_state(None);
    let j = add(
        &state,
        serde_json::json!({"character": "爱", "pinyin": "ài", "definition": "love"}),
    )
    .await;
    assert_eq!(j["character"], "爱");
    assert_eq!(j["pinyin"], "ài");
    assert_eq!(j["familiarity"], 0);
    assert!(j["id"].is_i64());
    assert!(j["created_at"].is_i64());
}

#[tokio::test]
async fn add_duplicate_returns_400() {
    let state = test_state(None);
    add(&state, serde_json::json!({"character": "爱"})).await;
    let resp = router(state)
        .oneshot(json_req("POST", "/add", serde_json::json!({"character": "爱"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let j = body_json(resp).await;
    assert!(j["error"].as_str().unwrap().contains("already known"));
}

#[tokio::test]
async fn add_blank_character_returns_400() {
    let resp = router(test_state(None))
        .oneshot(json_req("POST", "/add", serde_json::json!({"character": "  "})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- Read / list / delete ---

#[tokio::test]
async fn list_defaults_and_pagination() {
    let state = test_state(None);
    for c in ["一", "二", "三"] {
        add(&state, serde_json::json!({"character": c})).await;
    }

    let resp = router(state.clone())
        .oneshot(get_req("/characters"))
        .await
        .unwrap();
    let j = body_json(resp).await;
    let chars: Vec<&str> = j
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["character"].as_str().unwrap())
        .collect();
    assert_eq!(chars, ["一", "二", "三"]);

    let resp = router(state)
        .oneshot(get_req("/characters?offset=1&limit=1"))
        .await
        .unwrap();
    let j = body_json(resp).await;
    assert_eq!(j.as_array().unwrap().len(), 1);
    assert_eq!(j[0]["character"], "二");
}

#[tokio::test]
async fn list_with_huge_offset_is_empty() {
    let state = test_state(None);
    add(&state, serde_json::json!({"character": "一"})).await;

    let resp = router(state)
        .oneshot(get_req(&format!("/characters?offset={}", usize::MAX)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn get_and_delete_by_id() {
    let state = test_state(None);
    let rec = add(&state, serde_json::json!({"character": "猫", "definition": "cat"})).await;
    let id = rec["id"].as_i64().unwrap();

    let resp = router(state.clone())
        .oneshot(get_req(&format!("/characters/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["definition"], "cat");

    let resp = router(state.clone())
        .oneshot(req("DELETE", &format!("/characters/{id}"), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["character"], "猫");

    let resp = router(state.clone())
        .oneshot(req("DELETE", &format!("/characters/{id}"), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = router(state)
        .oneshot(get_req(&format!("/lookup/{}", encode("猫"))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lookup_by_character() {
    let state = test_state(None);
    add(&state, serde_json::json!({"character": "八", "pinyin": "bā"})).await;
    let resp = router(state)
        .oneshot(get_req(&format!("/lookup/{}", encode("八"))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["pinyin"], "bā");
}

// --- Search ---

#[tokio::test]
async fn search_finds_matches() {
    let state = test_state(None);
    add(&state, serde_json::json!({"character": "爱", "definition": "love"})).await;
    add(&state, serde_json::json!({"character": "八", "definition": "eight"})).await;

    let resp = router(state)
        .oneshot(get_req(&format!("/search?q={}", encode("爱"))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j.as_array().unwrap().len(), 1);
    assert_eq!(j[0]["character"], "爱");
}

#[tokio::test]
async fn search_empty_query_returns_400() {
    let resp = router(test_state(None))
        .oneshot(get_req("/search?q="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_whitespace_query_is_a_literal_needle() {
    let state = test_state(None);
    add(&state, serde_json::json!({"character": "喜欢", "definition": "to like"})).await;
    add(&state, serde_json::json!({"character": "八", "definition": "eight"})).await;

    let resp = router(state)
        .oneshot(get_req("/search?q=%20"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j.as_array().unwrap().len(), 1);
    assert_eq!(j[0]["character"], "喜欢");
}

// --- Suggest ---

#[tokio::test]
async fn suggest_skips_known_word() {
    let state = test_state(None);
    add(&state, serde_json::json!({"character": "爱"})).await;

    let resp = router(state).oneshot(get_req("/suggest")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["character"], "八");
    assert_eq!(j["pinyin"], "bā");
    assert_eq!(j["definition"], "eight");
}

#[tokio::test]
async fn suggest_when_everything_known_returns_404() {
    let state = test_state(None);
    add(&state, serde_json::json!({"character": "爱"})).await;
    add(&state, serde_json::json!({"character": "八"})).await;

    let resp = router(state).oneshot(get_req("/suggest")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let j = body_json(resp).await;
    assert_eq!(j["error"], "no new words to suggest");
}

#[tokio::test]
async fn suggest_with_builtin_catalog() {
    let state = test_state_with(Catalog::builtin().unwrap(), None);
    let resp = router(state.clone()).oneshot(get_req("/suggest")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    let character = j["character"].as_str().unwrap();
    assert!(state.suggester.catalog().get(character).is_some());
}
