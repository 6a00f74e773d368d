//! Router-level smoke tests driven through tower without a live socket.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use shelfline_core::config::Config;
use shelfline_server::api::routes::build_router;
use shelfline_server::state::AppState;

fn test_router() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut config: Config = toml::from_str("").unwrap();
    config.database.path = dir.path().join("test.db");
    config.media.poster_dir = dir.path().join("posters");
    config.metadata.api_key = "test-key".to_string();

    let state = AppState::new(config).unwrap();
    (build_router(state), dir)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let (router, _dir) = test_router();
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn config_endpoint_redacts_the_api_key() {
    let (router, _dir) = test_router();
    let response = router
        .oneshot(Request::get("/api/v1/config").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["metadata"]["api_key_configured"], json!(true));
    assert!(!body.to_string().contains("test-key"));
}

#[tokio::test]
async fn record_crud_round_trip() {
    let (router, _dir) = test_router();

    let create = Request::post("/api/v1/records")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "tmdb_id": 603,
                "title": "The Matrix",
                "overview": "",
                "release_year": 1999,
                "genres": "Action",
                "certification": "15",
                "original_language": "en",
                "production_companies": "",
                "tagline": "",
                "director": "",
                "disposition": "kept",
                "medium": "physical",
                "special_edition": false,
                "box_set": false,
                "box_set_name": "",
                "unopened": false,
                "unwatched": true,
                "storage_label": "Shelf A",
                "copy_number": 1,
                "copy_notes": ""
            })
            .to_string(),
        ))
        .unwrap();
    let response = router.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], json!("The Matrix"));

    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/records/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["certification"], json!("15"));
    assert_eq!(fetched["storage_label"], json!("Shelf A"));

    let patch = Request::patch(format!("/api/v1/records/{id}"))
        .header("content-type", "application/json")
        .body(Body::from(json!({"unwatched": false}).to_string()))
        .unwrap();
    let response = router.clone().oneshot(patch).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["unwatched"], json!(false));

    let response = router
        .clone()
        .oneshot(
            Request::delete(format!("/api/v1/records/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(
            Request::get(format!("/api/v1/records/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_record_is_a_json_error() {
    let (router, _dir) = test_router();
    let response = router
        .oneshot(
            Request::get("/api/v1/records/9999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn bulk_endpoints_without_a_batch() {
    let (router, _dir) = test_router();

    let response = router
        .clone()
        .oneshot(Request::get("/api/v1/bulk").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .oneshot(
            Request::post("/api/v1/bulk/commit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn in_transit_create_rejects_a_taken_slot() {
    let (router, _dir) = test_router();

    let record = |title: &str| {
        json!({
            "title": title,
            "overview": "",
            "genres": "",
            "certification": "",
            "original_language": "",
            "production_companies": "",
            "tagline": "",
            "director": "",
            "disposition": "in_transit",
            "medium": "physical",
            "special_edition": false,
            "box_set": false,
            "box_set_name": "",
            "unopened": false,
            "unwatched": false,
            "storage_label": "",
            "slot": "5",
            "copy_number": 1,
            "copy_notes": ""
        })
    };

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/records")
                .header("content-type", "application/json")
                .body(Body::from(record("First").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/records")
                .header("content-type", "application/json")
                .body(Body::from(record("Second").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .oneshot(
            Request::get("/api/v1/locations/next")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({"next": "6"}));
}

#[tokio::test]
async fn unknown_refresh_task_is_not_found() {
    let (router, _dir) = test_router();
    let response = router
        .oneshot(
            Request::get("/api/v1/refresh/no-such-task")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
