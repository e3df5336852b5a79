//! Handlers for the shot transfer channel.
//!
//! Breakdown views push converted shots; the post-production view pulls
//! them once. Every endpoint is scoped to the caller's `X-Session-Id`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use palette_core::breakdown::{
    convert_music_video_shots, convert_story_shots, MusicVideoSection, StoryChapter,
};
use palette_core::error::CoreError;
use palette_core::shot::{PostProductionShot, ProjectType};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::session::SessionId;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryTransferRequest {
    pub project_id: String,
    pub chapters: Vec<StoryChapter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicVideoTransferRequest {
    pub project_id: String,
    pub sections: Vec<MusicVideoSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransferRequest {
    pub shots: Vec<PostProductionShot>,
    pub source: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferStored {
    pub count: usize,
    pub source: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferStatus {
    pub has_shots: bool,
}

fn require_project_id(project_id: &str) -> Result<(), CoreError> {
    if project_id.trim().is_empty() {
        return Err(CoreError::Validation("projectId must not be empty".into()));
    }
    Ok(())
}

fn store(
    state: &AppState,
    session: &SessionId,
    shots: Vec<PostProductionShot>,
    source: &str,
) -> AppResult<impl IntoResponse> {
    let count = state.transfer.store_shots_for_transfer(
        session.as_str(),
        shots,
        source,
        chrono::Utc::now(),
    )?;
    Ok(Json(ApiResponse::ok(TransferStored {
        count,
        source: source.to_string(),
    })))
}

// ---------------------------------------------------------------------------
// POST /transfer/story
// ---------------------------------------------------------------------------

/// Convert a story breakdown and place its shots in the transfer slot.
pub async fn transfer_story(
    State(state): State<AppState>,
    session: SessionId,
    AppJson(input): AppJson<StoryTransferRequest>,
) -> AppResult<impl IntoResponse> {
    require_project_id(&input.project_id)?;
    let shots = convert_story_shots(&input.project_id, &input.chapters, chrono::Utc::now());
    store(&state, &session, shots, ProjectType::Story.id_prefix())
}

// ---------------------------------------------------------------------------
// POST /transfer/music-video
// ---------------------------------------------------------------------------

/// Convert a music-video breakdown and place its shots in the transfer slot.
pub async fn transfer_music_video(
    State(state): State<AppState>,
    session: SessionId,
    AppJson(input): AppJson<MusicVideoTransferRequest>,
) -> AppResult<impl IntoResponse> {
    require_project_id(&input.project_id)?;
    let shots =
        convert_music_video_shots(&input.project_id, &input.sections, chrono::Utc::now());
    store(&state, &session, shots, ProjectType::MusicVideo.id_prefix())
}

// ---------------------------------------------------------------------------
// POST /transfer
// ---------------------------------------------------------------------------

/// Place already-converted shots in the transfer slot.
pub async fn transfer_shots(
    State(state): State<AppState>,
    session: SessionId,
    AppJson(input): AppJson<RawTransferRequest>,
) -> AppResult<impl IntoResponse> {
    if input.source.trim().is_empty() {
        return Err(CoreError::Validation("source must not be empty".into()).into());
    }
    store(&state, &session, input.shots, input.source.trim())
}

// ---------------------------------------------------------------------------
// GET /transfer
// ---------------------------------------------------------------------------

/// Take the pending transfer. `data` is `null` when there is none.
pub async fn retrieve(
    State(state): State<AppState>,
    session: SessionId,
) -> AppResult<impl IntoResponse> {
    let envelope = state
        .transfer
        .retrieve_transferred_shots(session.as_str())?;
    Ok(Json(ApiResponse::ok(envelope)))
}

// ---------------------------------------------------------------------------
// GET /transfer/status
// ---------------------------------------------------------------------------

/// Report whether a transfer is pending without consuming it.
pub async fn status(
    State(state): State<AppState>,
    session: SessionId,
) -> AppResult<impl IntoResponse> {
    let has_shots = state.transfer.has_transferred_shots(session.as_str())?;
    Ok(Json(ApiResponse::ok(TransferStatus { has_shots })))
}

// ---------------------------------------------------------------------------
// DELETE /transfer
// ---------------------------------------------------------------------------

/// Drop the pending transfer, if any.
pub async fn clear(
    State(state): State<AppState>,
    session: SessionId,
) -> AppResult<impl IntoResponse> {
    state.transfer.clear_transferred_shots(session.as_str())?;
    tracing::info!(session = session.as_str(), "Cleared transfer slot");
    Ok(Json(ApiResponse::ok(serde_json::json!({ "cleared": true }))))
}
