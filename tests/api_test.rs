//! HTTP-level tests for the user and thread read models.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use forum_comments_service::api::{build_router, AppState};
use forum_comments_service::search::{SearchConfig, ThreadSearchService};
use forum_comments_service::state::InMemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

async fn test_router() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = SearchConfig {
        index_path: dir.path().to_path_buf(),
        ..Default::default()
    };

    let store = Arc::new(InMemoryStore::new());
    let search = Arc::new(
        ThreadSearchService::new(config, store.clone())
            .await
            .unwrap(),
    );

    (build_router(AppState::new(store, search)), dir)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn thread_body(title: &str, author: &str) -> Value {
    json!({
        "course_id": "course-v1:Demo",
        "commentable_id": "general",
        "title": title,
        "body": "thread body",
        "author_id": author,
    })
}

#[tokio::test]
async fn test_user_crud_roundtrip() {
    let (app, _dir) = test_router().await;

    let (status, created) =
        post_json(&app, "/v1/users", json!({"id": "42", "username": "alice"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["username"], "alice");
    assert_eq!(created["default_sort_key"], "date");

    let (status, fetched) = get_json(&app, "/v1/users/42").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["external_id"], "42");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/v1/users/42")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"default_sort_key": "activity"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, updated) = get_json(&app, "/v1/users/42").await;
    assert_eq!(updated["default_sort_key"], "activity");
}

#[tokio::test]
async fn test_active_threads_ordering_and_dedup() {
    let (app, _dir) = test_router().await;

    // Alice authors thread A, then comments on Bob's thread B; B has the
    // most recent activity from Alice, so it lists first. Two comments on
    // the same thread appear once.
    let (_, thread_a) = post_json(&app, "/v1/threads", thread_body("Thread A", "alice")).await;
    let (_, thread_b) = post_json(&app, "/v1/threads", thread_body("Thread B", "bob")).await;
    let thread_b_id = thread_b["id"].as_str().unwrap();

    let comment_uri = format!("/v1/threads/{}/comments", thread_b_id);
    let (status, _) = post_json(
        &app,
        &comment_uri,
        json!({"body": "first comment", "author_id": "alice"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = post_json(
        &app,
        &comment_uri,
        json!({"body": "second comment", "author_id": "alice"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, page) = get_json(
        &app,
        "/v1/users/alice/active_threads?course_id=course-v1:Demo",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let collection = page["collection"].as_array().unwrap();
    assert_eq!(collection.len(), 2);
    assert_eq!(collection[0]["id"], thread_b["id"]);
    assert_eq!(collection[1]["id"], thread_a["id"]);
    assert_eq!(page["num_pages"], 1);
    assert_eq!(page["page"], 1);
}

#[tokio::test]
async fn test_active_threads_page_clamped_into_range() {
    let (app, _dir) = test_router().await;

    post_json(&app, "/v1/threads", thread_body("Only one", "alice")).await;

    let (status, page) = get_json(
        &app,
        "/v1/users/alice/active_threads?course_id=course-v1:Demo&page=7&per_page=5",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 1);
    assert_eq!(page["collection"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_active_threads_without_course_is_empty() {
    let (app, _dir) = test_router().await;

    let (status, page) = get_json(&app, "/v1/users/alice/active_threads").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["collection"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recent_active_threads_endpoint() {
    let (app, _dir) = test_router().await;

    post_json(&app, "/v1/threads", thread_body("Quiet thread", "alice")).await;
    let (_, busy) = post_json(&app, "/v1/threads", thread_body("Busy thread", "bob")).await;

    // A comment bumps the busy thread's activity
    let comment_uri = format!("/v1/threads/{}/comments", busy["id"].as_str().unwrap());
    post_json(
        &app,
        &comment_uri,
        json!({"body": "bump", "author_id": "carol"}),
    )
    .await;

    let (status, threads) = get_json(
        &app,
        "/v1/threads/recent_active?course_id=course-v1:Demo",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let threads = threads.as_array().unwrap().clone();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0]["id"], busy["id"]);

    // Without a course scope the listing is empty
    let (status, empty) = get_json(&app, "/v1/threads/recent_active").await;
    assert_eq!(status, StatusCode::OK);
    assert!(empty.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_comment_creation_bumps_thread_counters() {
    let (app, _dir) = test_router().await;

    let (_, thread) = post_json(&app, "/v1/threads", thread_body("Counted", "alice")).await;
    let thread_id = thread["id"].as_str().unwrap();

    let comment_uri = format!("/v1/threads/{}/comments", thread_id);
    post_json(
        &app,
        &comment_uri,
        json!({"body": "a comment", "author_id": "bob"}),
    )
    .await;

    let (_, refreshed) = get_json(&app, &format!("/v1/threads/{}", thread_id)).await;
    assert_eq!(refreshed["comment_count"], 1);
}

#[tokio::test]
async fn test_comment_on_missing_thread_is_404() {
    let (app, _dir) = test_router().await;

    let (status, _) = post_json(
        &app,
        &format!("/v1/threads/{}/comments", uuid::Uuid::new_v4()),
        json!({"body": "orphan", "author_id": "bob"}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_search_returns_parent_thread() {
    let (app, _dir) = test_router().await;

    let (_, thread) = post_json(&app, "/v1/threads", thread_body("Parent", "alice")).await;
    let comment_uri = format!("/v1/threads/{}/comments", thread["id"].as_str().unwrap());
    post_json(
        &app,
        &comment_uri,
        json!({"body": "unmistakable zanzibar keyword", "author_id": "bob"}),
    )
    .await;

    let (status, outcome) = get_json(&app, "/v1/search/threads?text=zanzibar").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["total_results"], 1);
    assert_eq!(outcome["collection"][0]["id"], thread["id"]);
}
