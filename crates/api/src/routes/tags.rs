//! Route definitions for artist tags.

use axum::routing::post;
use axum::Router;

use crate::handlers::tags;
use crate::state::AppState;

/// Tag routes.
///
/// ```text
/// POST   /artist     -> create_tag
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/artist", post(tags::create_tag))
}
