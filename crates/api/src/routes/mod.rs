pub mod export;
pub mod generation;
pub mod health;
pub mod prompts;
pub mod references;
pub mod tags;
pub mod transfer;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /export                               render shots (POST)
///
/// /tags/artist                          normalize an artist name (POST)
///
/// /prompts/expand                       expand a dynamic prompt (POST)
///
/// /transfer                             store raw shots (POST), take (GET), clear (DELETE)
/// /transfer/status                      pending check (GET)
/// /transfer/story                       convert + store a story breakdown (POST)
/// /transfer/music-video                 convert + store a music-video breakdown (POST)
///
/// /references/extract                   extract @tags from text (POST)
///
/// /generation/predictions               start a prediction (POST, ?wait=true)
/// /generation/predictions/{id}          prediction status (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/export", export::router())
        .nest("/tags", tags::router())
        .nest("/prompts", prompts::router())
        .nest("/transfer", transfer::router())
        .nest("/references", references::router())
        .nest("/generation", generation::router())
}
