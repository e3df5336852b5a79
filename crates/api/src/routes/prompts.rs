use axum::routing::post;
use axum::Router;

use crate::handlers::prompts;
use crate::state::AppState;

/// Prompt routes.
///
/// ```text
/// POST   /expand     -> expand
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/expand", post(prompts::expand))
}
