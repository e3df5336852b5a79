//! Handlers for generation predictions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use palette_providers::replicate::{PredictionRequest, ReplicateClient};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreatePredictionParams {
    /// Block until the prediction finishes or the poll budget runs out.
    #[serde(default)]
    pub wait: bool,
}

fn replicate(state: &AppState) -> Result<&ReplicateClient, AppError> {
    state
        .replicate
        .as_deref()
        .ok_or_else(|| AppError::ServiceUnavailable("Generation is not configured".into()))
}

// ---------------------------------------------------------------------------
// POST /generation/predictions
// ---------------------------------------------------------------------------

/// Start a prediction, optionally waiting for its result.
pub async fn create_prediction(
    State(state): State<AppState>,
    Query(params): Query<CreatePredictionParams>,
    AppJson(input): AppJson<PredictionRequest>,
) -> AppResult<impl IntoResponse> {
    let client = replicate(&state)?;
    let mut prediction = client.create_prediction(&input).await?;

    if params.wait && !prediction.status.is_terminal() {
        prediction = client
            .wait_for_prediction(&prediction.id, &state.config.replicate_poll)
            .await?;
    }

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(prediction))))
}

// ---------------------------------------------------------------------------
// GET /generation/predictions/{id}
// ---------------------------------------------------------------------------

/// Fetch the current state of a prediction.
pub async fn get_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let prediction = replicate(&state)?.get_prediction(&id).await?;
    Ok(Json(ApiResponse::ok(prediction)))
}
