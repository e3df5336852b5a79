//! Integration tests for the provider-backed endpoints.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{body_json, get, post_json};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use palette_api::state::AppState;
use palette_providers::openai::OpenAiClient;
use palette_providers::replicate::ReplicateClient;

fn state_with_mocks(server: &MockServer) -> AppState {
    let mut state = AppState::from_config(common::test_config()).unwrap();
    state.openai = Some(Arc::new(OpenAiClient::with_client(
        reqwest::Client::new(),
        server.uri(),
        "sk-test".to_string(),
        "gpt-4o-mini".to_string(),
    )));
    state.replicate = Some(Arc::new(ReplicateClient::with_client(
        reqwest::Client::new(),
        server.uri(),
        "r8-test".to_string(),
    )));
    state
}

// ---------------------------------------------------------------------------
// Unconfigured providers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn extraction_without_key_is_unavailable() {
    let app = common::build_test_app();
    let response = post_json(app, "/api/v1/references/extract", json!({ "text": "x" })).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn generation_without_token_is_unavailable() {
    let app = common::build_test_app();
    let response = get(app, "/api/v1/generation/predictions/abc").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ---------------------------------------------------------------------------
// POST /api/v1/references/extract
// ---------------------------------------------------------------------------

#[tokio::test]
async fn extraction_returns_normalized_references() {
    let server = MockServer::start().await;
    let reply = r#"{"characters":[{"name":"Captain Mara"}],"locations":[{"name":"Old Pier","description":"rotting boards"}],"props":[]}"#;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": reply } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = common::build_app_with_state(state_with_mocks(&server));
    let response = post_json(
        app,
        "/api/v1/references/extract",
        json!({ "text": "Captain Mara waits on the Old Pier for @Hero." }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["characters"][0]["tag"], "@captain_mara");
    assert_eq!(json["data"]["locations"][0]["tag"], "@old_pier");
    assert_eq!(json["data"]["locations"][0]["description"], "rotting boards");
    assert_eq!(json["data"]["mentionedTags"], json!(["@hero"]));
}

#[tokio::test]
async fn extraction_rejects_empty_text_without_calling_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = common::build_app_with_state(state_with_mocks(&server));
    let response = post_json(app, "/api/v1/references/extract", json!({ "text": "  " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upstream_failure_maps_to_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let app = common::build_app_with_state(state_with_mocks(&server));
    let response = post_json(app, "/api/v1/references/extract", json!({ "text": "a story" })).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = body_json(response).await;
    assert_eq!(json["code"], "UPSTREAM_ERROR");
}

// ---------------------------------------------------------------------------
// /api/v1/generation/predictions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_and_wait_returns_finished_prediction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/models/black-forest-labs/flux-schnell/predictions"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": "p9", "status": "starting" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/predictions/p9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p9",
            "status": "succeeded",
            "output": ["https://cdn.example.test/out.png"]
        })))
        .mount(&server)
        .await;

    let app = common::build_app_with_state(state_with_mocks(&server));
    let response = post_json(
        app,
        "/api/v1/generation/predictions?wait=true",
        json!({ "model": "black-forest-labs/flux-schnell", "input": { "prompt": "a fox" } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "succeeded");
    assert_eq!(json["data"]["output"][0], "https://cdn.example.test/out.png");
}

#[tokio::test]
async fn request_with_both_version_and_model_is_rejected() {
    let server = MockServer::start().await;
    let app = common::build_app_with_state(state_with_mocks(&server));

    let response = post_json(
        app,
        "/api/v1/generation/predictions",
        json!({ "version": "abc", "model": "a/b", "input": {} }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_prediction_passes_through_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/predictions/p1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "p1", "status": "processing" })),
        )
        .mount(&server)
        .await;

    let app = common::build_app_with_state(state_with_mocks(&server));
    let json = body_json(get(app, "/api/v1/generation/predictions/p1").await).await;
    assert_eq!(json["data"]["status"], "processing");
}

#[tokio::test]
async fn traversing_model_name_is_rejected_before_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let app = common::build_app_with_state(state_with_mocks(&server));
    let response = post_json(
        app,
        "/api/v1/generation/predictions",
        json!({ "model": "../account", "input": {} }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}
