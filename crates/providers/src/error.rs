use palette_core::error::CoreError;

/// Errors from the upstream provider clients.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response whose body did not have the expected shape.
    #[error("Unexpected {provider} response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    /// Input rejected before any request was sent.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The prediction reached `failed` or `canceled`.
    #[error("Prediction {id} ended as {status}: {reason}")]
    PredictionFailed {
        id: String,
        status: String,
        reason: String,
    },

    /// The prediction was still running after the last poll.
    #[error("Prediction {id} did not finish after {attempts} polls")]
    PollTimeout { id: String, attempts: u32 },
}
