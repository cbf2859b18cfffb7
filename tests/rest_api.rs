//! REST API Tests
//!
//! Router behavior over a configured memory store:
//! - Query strings become parameter bags
//! - `relations` overrides per-entity defaults
//! - Engine errors map to HTTP status codes

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use lms_query::config::Config;
use lms_query::query::QueryEngine;
use lms_query::rest_api::{build_router, AppState};

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config() -> Config {
    Config::from_json_str(
        &json!({
            "entities": [
                {
                    "name": "department",
                    "columns": [
                        {"name": "id", "type": "int"},
                        {"name": "title", "type": "varchar"}
                    ],
                    "rows": [
                        {"id": 1, "title": "Mathematics"},
                        {"id": 2, "title": "Physics"}
                    ]
                },
                {
                    "name": "course",
                    "columns": [
                        {"name": "id", "type": "int"},
                        {"name": "name", "type": "varchar"},
                        {"name": "status", "type": "simple-enum"},
                        {"name": "departmentId", "type": "int"},
                        {"name": "createdAt", "type": "timestamp"}
                    ],
                    "relations": [
                        {"name": "department", "target": "department", "local_column": "departmentId"}
                    ],
                    "search_columns": ["name"],
                    "default_relations": ["department"],
                    "rows": [
                        {"id": 1, "name": "Algebra", "status": "ACTIVE", "departmentId": 1, "createdAt": "2024-02-01T00:00:00Z"},
                        {"id": 2, "name": "Optics", "status": "ACTIVE", "departmentId": 2, "createdAt": "2024-02-02T00:00:00Z"},
                        {"id": 3, "name": "Geometry", "status": "ARCHIVED", "departmentId": 1, "createdAt": "2024-02-03T00:00:00Z"}
                    ]
                }
            ]
        })
        .to_string(),
    )
    .unwrap()
}

fn test_router() -> Router {
    let config = test_config();
    let engine = QueryEngine::new(Arc::new(config.build_store()));
    build_router(AppState::new(engine, config.profiles()))
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = test_router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// Routes
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_list_with_filter_and_default_relations() {
    let (status, body) = get("/api/course?status=ACTIVE&sort=id:asc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["data"][0]["name"], "Algebra");
    assert_eq!(body["data"][0]["department"]["title"], "Mathematics");
    assert_eq!(body["data"][1]["department"]["title"], "Physics");
}

#[tokio::test]
async fn test_relations_override() {
    let (status, body) = get("/api/course?relations=&limit=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], 1);
    assert!(body["data"][0].get("department").is_none());
}

#[tokio::test]
async fn test_repeated_key_is_list_filter() {
    let (status, body) = get("/api/course?name=o&name=e").await;

    // Only "Geometry" contains both
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["name"], "Geometry");
}

#[tokio::test]
async fn test_search_uses_profile_columns() {
    let (status, body) = get("/api/course/search?search=tics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["name"], "Optics");
}

#[tokio::test]
async fn test_get_by_id() {
    let (status, body) = get("/api/course/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Geometry");
    assert_eq!(body["department"]["id"], 1);

    let (status, body) = get("/api/course/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

// =============================================================================
// Error Mapping
// =============================================================================

#[tokio::test]
async fn test_invalid_pagination_is_bad_request() {
    let (status, body) = get("/api/course?page=-1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_unknown_entity_is_not_found() {
    let (status, _) = get("/api/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_relation_is_not_found() {
    let (status, _) = get("/api/course?relations=teacher").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
