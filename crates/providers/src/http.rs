//! Response helpers shared by the provider clients.

use serde::de::DeserializeOwned;

use crate::error::ProviderError;

/// Return the response unchanged on a 2xx status, otherwise a
/// [`ProviderError::Api`] carrying the status and body text.
pub(crate) async fn ensure_success(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        tracing::warn!(provider, status = status.as_u16(), "Upstream returned error status");
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub(crate) async fn parse_response<T: DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let response = ensure_success(provider, response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::Decode {
        provider,
        message: e.to_string(),
    })
}
