#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use palette_api::config::ServerConfig;
use palette_api::router::build_app_router;
use palette_api::state::AppState;
use palette_core::rate_limit::RateLimit;
use palette_providers::replicate::PollConfig;

/// Build a test `ServerConfig` with safe defaults.
///
/// In-memory transfers, no provider credentials, and a generous rate limit.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        rate_limit: RateLimit::new(1_000, 60),
        transfer_dir: None,
        openai_api_key: None,
        openai_model: "gpt-4o-mini".to_string(),
        replicate_api_token: None,
        replicate_poll: PollConfig {
            interval: Duration::from_millis(5),
            max_attempts: 3,
        },
    }
}

/// Build the full application router from `config`.
pub fn build_app_with(config: ServerConfig) -> Router {
    let state = AppState::from_config(config.clone()).unwrap();
    build_app_router(state, &config)
}

/// Build the full application router from an explicit state.
pub fn build_app_with_state(state: AppState) -> Router {
    let config = (*state.config).clone();
    build_app_router(state, &config)
}

/// Build the full application router with the test configuration.
pub fn build_test_app() -> Router {
    build_app_with(test_config())
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_with_session(app: Router, uri: &str, session: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("x-session-id", session)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_json_with_session(app, uri, body, None).await
}

pub async fn post_json_with_session(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    session: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(session) = session {
        builder = builder.header("x-session-id", session);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn delete_with_session(app: Router, uri: &str, session: &str) -> Response<Body> {
    let request = Request::delete(uri)
        .header("x-session-id", session)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
