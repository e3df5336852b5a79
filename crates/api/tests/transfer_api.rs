//! Integration tests for the shot transfer endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_with_session, get_with_session, post_json_with_session};
use serde_json::json;

fn story_body() -> serde_json::Value {
    json!({
        "projectId": "p1",
        "chapters": [
            {
                "id": "c1",
                "title": "Arrival",
                "shots": [
                    { "description": "Harbor at dawn" },
                    { "prompt": "@hero steps off the ferry", "directorStyle": "Kurosawa" }
                ]
            }
        ]
    })
}

// ---------------------------------------------------------------------------
// Store then retrieve consumes the slot
// ---------------------------------------------------------------------------

#[tokio::test]
async fn story_transfer_round_trip_consumes_once() {
    let app = common::build_test_app();

    let stored = post_json_with_session(
        app.clone(),
        "/api/v1/transfer/story",
        story_body(),
        Some("tab-1"),
    )
    .await;
    assert_eq!(stored.status(), StatusCode::OK);
    let stored = body_json(stored).await;
    assert_eq!(stored["data"]["count"], 2);
    assert_eq!(stored["data"]["source"], "story");

    let status = body_json(get_with_session(app.clone(), "/api/v1/transfer/status", "tab-1").await).await;
    assert_eq!(status["data"]["hasShots"], true);

    let first = body_json(get_with_session(app.clone(), "/api/v1/transfer", "tab-1").await).await;
    let shots = first["data"]["shots"].as_array().unwrap();
    assert_eq!(shots.len(), 2);
    assert_eq!(shots[0]["id"], "story_p1_c1_0");
    assert_eq!(shots[1]["id"], "story_p1_c1_1");
    assert_eq!(shots[1]["description"], "@hero steps off the ferry");
    assert_eq!(shots[1]["chapter"], "Arrival");
    assert_eq!(shots[1]["status"], "pending");
    assert!(first["data"]["transferredAt"].is_string());

    let second = body_json(get_with_session(app, "/api/v1/transfer", "tab-1").await).await;
    assert_eq!(second["success"], true);
    assert!(second["data"].is_null());
}

// ---------------------------------------------------------------------------
// Sessions do not see each other's shots
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sessions_are_isolated() {
    let app = common::build_test_app();

    post_json_with_session(app.clone(), "/api/v1/transfer/story", story_body(), Some("a")).await;

    let other = body_json(get_with_session(app.clone(), "/api/v1/transfer", "b").await).await;
    assert!(other["data"].is_null());

    let owner = body_json(get_with_session(app, "/api/v1/transfer/status", "a").await).await;
    assert_eq!(owner["data"]["hasShots"], true);
}

// ---------------------------------------------------------------------------
// Music-video ids and overwrite
// ---------------------------------------------------------------------------

#[tokio::test]
async fn later_transfer_overwrites_earlier() {
    let app = common::build_test_app();

    post_json_with_session(app.clone(), "/api/v1/transfer/story", story_body(), Some("s")).await;
    let mv = json!({
        "projectId": "p2",
        "sections": [
            { "id": "chorus", "sectionType": "chorus", "shots": [{ "description": "Crowd jumps" }] }
        ]
    });
    post_json_with_session(app.clone(), "/api/v1/transfer/music-video", mv, Some("s")).await;

    let json = body_json(get_with_session(app, "/api/v1/transfer", "s").await).await;
    assert_eq!(json["data"]["source"], "music-video");
    let shots = json["data"]["shots"].as_array().unwrap();
    assert_eq!(shots.len(), 1);
    assert_eq!(shots[0]["id"], "music-video_p2_chorus_0");
    assert_eq!(shots[0]["sourceSection"], "chorus");
}

// ---------------------------------------------------------------------------
// DELETE clears the slot
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_clears_pending_transfer() {
    let app = common::build_test_app();

    post_json_with_session(app.clone(), "/api/v1/transfer/story", story_body(), Some("s")).await;
    let response = delete_with_session(app.clone(), "/api/v1/transfer", "s").await;
    assert_eq!(response.status(), StatusCode::OK);

    let status = body_json(get_with_session(app, "/api/v1/transfer/status", "s").await).await;
    assert_eq!(status["data"]["hasShots"], false);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_session_id_is_rejected() {
    let app = common::build_test_app();
    let response = get_with_session(app, "/api/v1/transfer", "../../etc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_project_id_is_rejected() {
    let app = common::build_test_app();
    let response = post_json_with_session(
        app,
        "/api/v1/transfer/story",
        json!({ "projectId": " ", "chapters": [] }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = palette_api::config::ServerConfig {
        transfer_dir: Some(dir.path().to_path_buf()),
        ..common::test_config()
    };
    let app = common::build_app_with(config);

    post_json_with_session(app.clone(), "/api/v1/transfer/story", story_body(), Some("f")).await;
    let json = body_json(get_with_session(app.clone(), "/api/v1/transfer", "f").await).await;
    assert_eq!(json["data"]["shots"].as_array().unwrap().len(), 2);

    let again = body_json(get_with_session(app, "/api/v1/transfer", "f").await).await;
    assert!(again["data"].is_null());
}
