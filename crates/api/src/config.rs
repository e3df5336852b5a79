use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use palette_core::rate_limit::RateLimit;
use palette_providers::openai::DEFAULT_MODEL;
use palette_providers::replicate::PollConfig;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected} (got '{value}')")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. Provider
/// credentials are optional; their endpoints answer 503 when unset.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Per-client request limit for `/api/v1`.
    pub rate_limit: RateLimit,
    /// Directory for the file-backed transfer store. `None` keeps transfers
    /// in memory.
    pub transfer_dir: Option<PathBuf>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub replicate_api_token: Option<String>,
    /// Polling used when a prediction is created with `wait=true`.
    pub replicate_poll: PollConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `HOST`                         | `0.0.0.0`               |
    /// | `PORT`                         | `3000`                  |
    /// | `CORS_ORIGINS`                 | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                    |
    /// | `RATE_LIMIT_MAX_REQUESTS`      | `60`                    |
    /// | `RATE_LIMIT_WINDOW_SECS`       | `60`                    |
    /// | `TRANSFER_DIR`                 | unset (in-memory)       |
    /// | `OPENAI_API_KEY`               | unset                   |
    /// | `OPENAI_MODEL`                 | `gpt-4o-mini`           |
    /// | `REPLICATE_API_TOKEN`          | unset                   |
    /// | `REPLICATE_POLL_INTERVAL_SECS` | `2`                     |
    /// | `REPLICATE_POLL_MAX_ATTEMPTS`  | `10`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_var(&var, "PORT", 3000, "u16")?;

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_var(&var, "REQUEST_TIMEOUT_SECS", 30, "u64")?;

        let rate_limit = RateLimit::new(
            parse_var(&var, "RATE_LIMIT_MAX_REQUESTS", 60, "u32")?,
            parse_var(&var, "RATE_LIMIT_WINDOW_SECS", 60, "u64")?,
        );

        let replicate_poll = PollConfig {
            interval: Duration::from_secs(parse_var(&var, "REPLICATE_POLL_INTERVAL_SECS", 2, "u64")?),
            max_attempts: parse_var(&var, "REPLICATE_POLL_MAX_ATTEMPTS", 10, "u32")?,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            rate_limit,
            transfer_dir: var("TRANSFER_DIR").map(PathBuf::from),
            openai_api_key: var("OPENAI_API_KEY"),
            openai_model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            replicate_api_token: var("REPLICATE_API_TOKEN"),
            replicate_poll,
        })
    }
}

fn parse_var<T, F>(
    var: &F,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}
