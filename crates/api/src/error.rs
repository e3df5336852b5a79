use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use palette_core::error::CoreError;
use palette_providers::ProviderError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`ProviderError`] and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce the
/// `{ "success": false, "error": ..., "code": ... }` body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `palette_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An upstream provider failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A feature whose backing service is not configured.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

type Classified = (StatusCode, &'static str, String);

fn internal(context: &str, detail: &dyn std::fmt::Display) -> Classified {
    tracing::error!(error = %detail, "{context}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core(err: &CoreError) -> Classified {
    match err {
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::RateLimited { .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "Too many requests, please try again later".to_string(),
        ),
        CoreError::Serialization(e) => internal("Serialization error", e),
        CoreError::Storage(msg) => internal("Transfer storage error", msg),
    }
}

/// Upstream failures map to 502/504. The message keeps the provider's
/// status and body so clients can see why generation failed.
fn classify_provider(err: &ProviderError) -> Classified {
    match err {
        ProviderError::Core(core) => classify_core(core),
        ProviderError::Request(e) => {
            tracing::error!(error = %e, "Upstream request failed");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Upstream service could not be reached".to_string(),
            )
        }
        ProviderError::Api { .. } | ProviderError::Decode { .. } => {
            tracing::warn!(error = %err, "Upstream error");
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", err.to_string())
        }
        ProviderError::PredictionFailed { .. } => {
            (StatusCode::BAD_GATEWAY, "PREDICTION_FAILED", err.to_string())
        }
        ProviderError::PollTimeout { .. } => {
            (StatusCode::GATEWAY_TIMEOUT, "PREDICTION_TIMEOUT", err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core(core),
            AppError::Provider(provider) => classify_provider(provider),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                msg.clone(),
            ),
            AppError::InternalError(msg) => internal("Internal error", msg),
        };

        let body = json!({
            "success": false,
            "error": message,
            "code": code,
        });

        let mut response = (status, axum::Json(body)).into_response();

        if let AppError::Core(CoreError::RateLimited {
            retry_after_secs, ..
        }) = &self
        {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(*retry_after_secs));
        }

        response
    }
}
