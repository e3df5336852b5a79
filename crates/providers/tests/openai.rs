use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use palette_core::error::CoreError;
use palette_providers::openai::OpenAiClient;
use palette_providers::ProviderError;

fn client_for(server: &MockServer) -> OpenAiClient {
    OpenAiClient::with_client(
        reqwest::Client::new(),
        server.uri(),
        "sk-test".to_string(),
        "gpt-4o-mini".to_string(),
    )
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    })
}

#[tokio::test]
async fn extract_references_sends_bearer_and_parses_reply() {
    let server = MockServer::start().await;
    let reply = r#"{"characters":[{"name":"Captain Mara","tag":"@Captain Mara","description":"sea captain"}],"locations":[],"props":[]}"#;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
        .expect(1)
        .mount(&server)
        .await;

    let refs = client_for(&server)
        .extract_references("Captain Mara sails at dawn.")
        .await
        .unwrap();

    assert_eq!(refs.characters.len(), 1);
    assert_eq!(refs.characters[0].tag, "@captain_mara");
}

#[tokio::test]
async fn upstream_error_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .extract_references("Some text")
        .await
        .unwrap_err();

    assert_matches!(err, ProviderError::Api { status: 429, ref body, .. } if body == "quota exceeded");
    assert!(err.to_string().contains("(429): quota exceeded"));
}

#[tokio::test]
async fn empty_choices_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .extract_references("Some text")
        .await
        .unwrap_err();
    assert_matches!(err, ProviderError::Decode { .. });
}

#[tokio::test]
async fn empty_text_is_rejected_without_a_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .extract_references("   ")
        .await
        .unwrap_err();
    assert_matches!(err, ProviderError::Core(CoreError::Validation(_)));
}
