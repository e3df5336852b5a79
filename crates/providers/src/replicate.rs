//! Replicate predictions client.
//!
//! Generation jobs are long-running: a prediction is created, then polled
//! at a fixed interval until it reaches a terminal status or the attempt
//! budget in [`PollConfig`] runs out.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use palette_core::error::CoreError;

use crate::error::ProviderError;
use crate::http::parse_response;

const PROVIDER: &str = "Replicate";

/// Public Replicate API base URL.
pub const DEFAULT_API_URL: &str = "https://api.replicate.com";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle status of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }
}

/// A prediction as reported by Replicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub logs: Option<String>,
}

impl Prediction {
    fn failure_reason(&self) -> String {
        match &self.error {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => "no error reported".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// What to run. Exactly one of `version` (a model version hash) or `model`
/// (`owner/name` of an official model) must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub input: serde_json::Value,
}

/// Validate a prediction request before it is sent.
pub fn validate_prediction_request(request: &PredictionRequest) -> Result<(), CoreError> {
    let version = request.version.as_deref().filter(|v| !v.trim().is_empty());
    let model = request.model.as_deref().filter(|m| !m.trim().is_empty());

    match (version, model) {
        (Some(_), Some(_)) => Err(CoreError::Validation(
            "Specify either a model version or a model name, not both".to_string(),
        )),
        (None, None) => Err(CoreError::Validation(
            "A model version or model name is required".to_string(),
        )),
        (None, Some(model)) if !is_valid_model_name(model.trim()) => {
            Err(CoreError::Validation(format!(
                "Model name must be in owner/name form (got '{model}')"
            )))
        }
        _ if !request.input.is_object() => Err(CoreError::Validation(
            "Prediction input must be a JSON object".to_string(),
        )),
        _ => Ok(()),
    }
}

/// `owner/name`, each part made of ASCII alphanumerics, `.`, `-` or `_`
/// and neither part a bare `.` or `..`.
fn is_valid_model_name(model: &str) -> bool {
    let parts: Vec<&str> = model.split('/').collect();
    parts.len() == 2
        && parts.iter().all(|part| {
            !part.is_empty()
                && *part != "."
                && *part != ".."
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        })
}

/// Polling parameters for [`ReplicateClient::wait_for_prediction`].
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between polls.
    pub interval: Duration,
    /// Number of polls before giving up.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the Replicate API.
#[derive(Debug, Clone)]
pub struct ReplicateClient {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
}

impl ReplicateClient {
    /// Create a client against the public API.
    pub fn new(api_token: String) -> Self {
        Self::with_client(reqwest::Client::new(), DEFAULT_API_URL.to_string(), api_token)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String, api_token: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    /// Start a prediction.
    ///
    /// Version requests go to `POST /v1/predictions`; official-model
    /// requests go to `POST /v1/models/{owner}/{name}/predictions`.
    pub async fn create_prediction(
        &self,
        request: &PredictionRequest,
    ) -> Result<Prediction, ProviderError> {
        validate_prediction_request(request)?;

        let (url, body) = match request.model.as_deref().filter(|m| !m.trim().is_empty()) {
            Some(model) => (
                format!("{}/v1/models/{}/predictions", self.api_url, model.trim()),
                serde_json::json!({ "input": request.input }),
            ),
            None => (
                format!("{}/v1/predictions", self.api_url),
                serde_json::json!({ "version": request.version, "input": request.input }),
            ),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let prediction: Prediction = parse_response(PROVIDER, response).await?;
        tracing::info!(
            prediction_id = %prediction.id,
            status = prediction.status.as_str(),
            "Created prediction"
        );
        Ok(prediction)
    }

    /// Fetch the current state of a prediction.
    pub async fn get_prediction(&self, id: &str) -> Result<Prediction, ProviderError> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::Validation(format!("Invalid prediction id '{id}'")).into());
        }

        let response = self
            .client
            .get(format!("{}/v1/predictions/{id}", self.api_url))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        parse_response(PROVIDER, response).await
    }

    /// Poll a prediction until it succeeds.
    ///
    /// Polls immediately, then every `config.interval`, at most
    /// `config.max_attempts` times. `failed` and `canceled` end the wait
    /// with [`ProviderError::PredictionFailed`].
    pub async fn wait_for_prediction(
        &self,
        id: &str,
        config: &PollConfig,
    ) -> Result<Prediction, ProviderError> {
        for attempt in 1..=config.max_attempts {
            let prediction = self.get_prediction(id).await?;
            tracing::debug!(
                prediction_id = id,
                attempt,
                status = prediction.status.as_str(),
                "Polled prediction",
            );

            match prediction.status {
                PredictionStatus::Succeeded => {
                    tracing::info!(prediction_id = id, attempt, "Prediction succeeded");
                    return Ok(prediction);
                }
                PredictionStatus::Failed | PredictionStatus::Canceled => {
                    let reason = prediction.failure_reason();
                    tracing::warn!(
                        prediction_id = id,
                        status = prediction.status.as_str(),
                        reason = %reason,
                        "Prediction did not succeed",
                    );
                    return Err(ProviderError::PredictionFailed {
                        id: id.to_string(),
                        status: prediction.status.as_str().to_string(),
                        reason,
                    });
                }
                PredictionStatus::Starting | PredictionStatus::Processing => {}
            }

            if attempt < config.max_attempts {
                tokio::time::sleep(config.interval).await;
            }
        }

        tracing::warn!(
            prediction_id = id,
            attempts = config.max_attempts,
            "Gave up waiting for prediction",
        );
        Err(ProviderError::PollTimeout {
            id: id.to_string(),
            attempts: config.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    // -- validate_prediction_request --

    #[test]
    fn version_request_is_valid() {
        let req = PredictionRequest {
            version: Some("5c7d5dc6dd8bf75c1acaa8565735e7986bc5b66206b55cca93cb72c9bf15ccaa".into()),
            input: json!({ "prompt": "a harbor at dawn" }),
            ..Default::default()
        };
        assert!(validate_prediction_request(&req).is_ok());
    }

    #[test]
    fn model_request_needs_owner_and_name() {
        let mut req = PredictionRequest {
            model: Some("black-forest-labs/flux-schnell".into()),
            input: json!({}),
            ..Default::default()
        };
        assert!(validate_prediction_request(&req).is_ok());

        req.model = Some("flux-schnell".into());
        assert_matches!(validate_prediction_request(&req), Err(CoreError::Validation(_)));
    }

    #[test]
    fn model_name_cannot_escape_models_path() {
        for model in [
            "../account",
            "owner/..",
            "./name",
            "owner/name/extra",
            "owner/na me",
            "owner/name?x=1",
            "/name",
        ] {
            let req = PredictionRequest {
                model: Some(model.into()),
                input: json!({}),
                ..Default::default()
            };
            assert_matches!(
                validate_prediction_request(&req),
                Err(CoreError::Validation(_)),
                "model {model:?}"
            );
        }
    }

    #[test]
    fn default_poll_config_matches_env_defaults() {
        let poll = PollConfig::default();
        assert_eq!(poll.interval, Duration::from_secs(2));
        assert_eq!(poll.max_attempts, 10);
    }

    #[test]
    fn exactly_one_target_required() {
        let none = PredictionRequest {
            input: json!({}),
            ..Default::default()
        };
        assert!(validate_prediction_request(&none).is_err());

        let both = PredictionRequest {
            version: Some("abc".into()),
            model: Some("a/b".into()),
            input: json!({}),
        };
        assert!(validate_prediction_request(&both).is_err());
    }

    #[test]
    fn input_must_be_object() {
        let req = PredictionRequest {
            version: Some("abc".into()),
            input: json!("just a string"),
            ..Default::default()
        };
        assert!(validate_prediction_request(&req).is_err());
    }

    // -- PredictionStatus --

    #[test]
    fn terminal_statuses() {
        assert!(PredictionStatus::Succeeded.is_terminal());
        assert!(PredictionStatus::Canceled.is_terminal());
        assert!(!PredictionStatus::Processing.is_terminal());
    }

    #[test]
    fn failure_reason_prefers_error_string() {
        let p: Prediction = serde_json::from_value(json!({
            "id": "abc",
            "status": "failed",
            "error": "NSFW content detected"
        }))
        .unwrap();
        assert_eq!(p.failure_reason(), "NSFW content detected");
    }
}
