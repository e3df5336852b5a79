use std::sync::{Arc, Mutex};

use palette_core::error::CoreError;
use palette_core::rate_limit::RateLimiter;
use palette_core::transfer::{FileStore, MemoryStore, TransferBridge};
use palette_providers::openai::OpenAiClient;
use palette_providers::replicate::ReplicateClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Single-slot shot transfer channel, namespaced per session.
    pub transfer: TransferBridge,
    /// Per-client request counters for `/api/v1`.
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
    /// OpenAI client, when `OPENAI_API_KEY` is set.
    pub openai: Option<Arc<OpenAiClient>>,
    /// Replicate client, when `REPLICATE_API_TOKEN` is set.
    pub replicate: Option<Arc<ReplicateClient>>,
}

impl AppState {
    /// Build state from configuration, opening the transfer store and
    /// creating provider clients for whichever credentials are present.
    pub fn from_config(config: ServerConfig) -> Result<Self, CoreError> {
        let transfer = match &config.transfer_dir {
            Some(dir) => {
                let store = FileStore::open(dir)?;
                tracing::info!(dir = %store.dir().display(), "Using file-backed transfer store");
                TransferBridge::new(store)
            }
            None => {
                tracing::info!("Using in-memory transfer store");
                TransferBridge::new(MemoryStore::new())
            }
        };

        let http = reqwest_client();

        let openai = config.openai_api_key.as_ref().map(|key| {
            Arc::new(OpenAiClient::with_client(
                http.clone(),
                palette_providers::openai::DEFAULT_API_URL.to_string(),
                key.clone(),
                config.openai_model.clone(),
            ))
        });
        if openai.is_none() {
            tracing::warn!("OPENAI_API_KEY not set, reference extraction disabled");
        }

        let replicate = config.replicate_api_token.as_ref().map(|token| {
            Arc::new(ReplicateClient::with_client(
                http.clone(),
                palette_providers::replicate::DEFAULT_API_URL.to_string(),
                token.clone(),
            ))
        });
        if replicate.is_none() {
            tracing::warn!("REPLICATE_API_TOKEN not set, generation disabled");
        }

        Ok(Self {
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(config.rate_limit))),
            config: Arc::new(config),
            transfer,
            openai,
            replicate,
        })
    }
}

fn reqwest_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("palette-api/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}
