//! Route definitions for the shot transfer channel.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::transfer;
use crate::state::AppState;

/// Transfer routes.
///
/// ```text
/// POST   /               -> transfer_shots (store converted shots)
/// GET    /               -> retrieve (take pending shots)
/// DELETE /               -> clear
/// GET    /status         -> status
/// POST   /story          -> transfer_story
/// POST   /music-video    -> transfer_music_video
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(transfer::transfer_shots)
                .get(transfer::retrieve)
                .delete(transfer::clear),
        )
        .route("/status", get(transfer::status))
        .route("/story", post(transfer::transfer_story))
        .route("/music-video", post(transfer::transfer_music_video))
}
