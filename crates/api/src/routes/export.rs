//! Route definitions for shot export.

use axum::routing::post;
use axum::Router;

use crate::handlers::export;
use crate::state::AppState;

/// Export routes.
///
/// ```text
/// POST   /               -> export_shots
/// POST   /story          -> export_story
/// POST   /music-video    -> export_music_video
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(export::export_shots))
        .route("/story", post(export::export_story))
        .route("/music-video", post(export::export_music_video))
}
