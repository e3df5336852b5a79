//! OpenAI chat-completions client.
//!
//! Only the `POST /v1/chat/completions` endpoint is wrapped; it backs
//! reference extraction.

use serde::{Deserialize, Serialize};

use palette_core::references::{
    build_extraction_prompt, parse_extraction_response, ExtractedReferences, ExtractionPrompt,
};

use crate::error::ProviderError;
use crate::http::parse_response;

const PROVIDER: &str = "OpenAI";

/// Public OpenAI API base URL.
pub const DEFAULT_API_URL: &str = "https://api.openai.com";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// HTTP client for the OpenAI API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client against the public API.
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_client(
            reqwest::Client::new(),
            DEFAULT_API_URL.to_string(),
            api_key,
            model,
        )
    }

    /// Create a client reusing an existing [`reqwest::Client`], against any
    /// OpenAI-compatible base URL.
    pub fn with_client(
        client: reqwest::Client,
        api_url: String,
        api_key: String,
        model: String,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run a system/user chat completion and return the reply text.
    pub async fn complete(&self, prompt: &ExtractionPrompt) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: 0.3,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: ChatResponse = parse_response(PROVIDER, response).await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::Decode {
                provider: PROVIDER,
                message: "completion had no message content".to_string(),
            })
    }

    /// Identify the characters, locations and props in `text`.
    pub async fn extract_references(
        &self,
        text: &str,
    ) -> Result<ExtractedReferences, ProviderError> {
        let prompt = build_extraction_prompt(text)?;
        let reply = self.complete(&prompt).await?;

        let references = parse_extraction_response(&reply).map_err(|e| ProviderError::Decode {
            provider: PROVIDER,
            message: e.to_string(),
        })?;

        tracing::info!(
            model = %self.model,
            references = references.len(),
            "Extracted references"
        );
        Ok(references)
    }
}
