//! Per-client rate limiting for the `/api/v1` routes.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use palette_core::rate_limit::RateLimiter;

use crate::error::AppError;
use crate::state::AppState;

pub const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Identify the caller: first `X-Forwarded-For` hop, then `X-Real-IP`.
///
/// Requests with neither share one bucket.
pub fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or("unknown")
        .to_string()
}

/// Middleware: count the request against the caller's window, answer 429
/// when it is exhausted, and report the remaining budget in headers.
pub async fn enforce(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(request.headers());
    let (limit, remaining) = {
        let mut limiter = state
            .rate_limiter
            .lock()
            .map_err(|_| AppError::InternalError("rate limiter lock poisoned".into()))?;
        let remaining = limiter.check(&key, Instant::now())?;
        (limiter.limit().max_requests, remaining)
    };

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
    Ok(response)
}

/// Periodically evict expired windows so idle clients do not accumulate.
pub fn spawn_prune_task(
    limiter: Arc<Mutex<RateLimiter>>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match limiter.lock() {
                Ok(mut limiter) => {
                    let evicted = limiter.prune(Instant::now());
                    if evicted > 0 {
                        tracing::debug!(
                            evicted,
                            tracked = limiter.tracked_keys(),
                            "Pruned rate-limit windows"
                        );
                    }
                }
                Err(_) => {
                    tracing::error!("Rate limiter lock poisoned, stopping prune task");
                    return;
                }
            }
        }
    })
}
