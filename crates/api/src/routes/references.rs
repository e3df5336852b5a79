use axum::routing::post;
use axum::Router;

use crate::handlers::references;
use crate::state::AppState;

/// Reference routes.
///
/// ```text
/// POST   /extract    -> extract
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/extract", post(references::extract))
}
