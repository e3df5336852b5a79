//! Route definitions for generation predictions.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Generation routes.
///
/// ```text
/// POST   /predictions        -> create_prediction (?wait=true blocks until done)
/// GET    /predictions/{id}   -> get_prediction
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/predictions", post(generation::create_prediction))
        .route("/predictions/{id}", get(generation::get_prediction))
}
