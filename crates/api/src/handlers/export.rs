//! Handlers for shot export.

use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use palette_core::breakdown::{
    music_video_export_shots, story_export_shots, MusicVideoSection, StoryChapter,
};
use palette_core::error::CoreError;
use palette_core::export::{process_shots_for_export, ExportConfig, ExportResult};
use palette_core::references::ExtractedReferences;
use palette_core::shot::ShotData;
use palette_core::variables::{unresolved_tokens, ExportVariables};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::response::ApiResponse;

/// Request body for `POST /export`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub shots: Vec<ShotData>,
    #[serde(default)]
    pub config: ExportConfig,
    #[serde(default)]
    pub variables: ExportVariables,
    /// References from `POST /references/extract`, merged as custom tags.
    #[serde(default)]
    pub references: ExtractedReferences,
}

/// Request body for `POST /export/story`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryExportRequest {
    pub project_id: String,
    pub chapters: Vec<StoryChapter>,
    #[serde(default)]
    pub config: ExportConfig,
    #[serde(default)]
    pub variables: ExportVariables,
    /// References from `POST /references/extract`, merged as custom tags.
    #[serde(default)]
    pub references: ExtractedReferences,
}

/// Request body for `POST /export/music-video`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicVideoExportRequest {
    pub project_id: String,
    pub sections: Vec<MusicVideoSection>,
    #[serde(default)]
    pub config: ExportConfig,
    #[serde(default)]
    pub variables: ExportVariables,
    /// References from `POST /references/extract`, merged as custom tags.
    #[serde(default)]
    pub references: ExtractedReferences,
}

/// Export result plus the tokens that found no value.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    #[serde(flatten)]
    pub result: ExportResult,
    pub unresolved_tokens: Vec<String>,
}

fn render(
    shots: &[ShotData],
    config: &ExportConfig,
    variables: ExportVariables,
    references: &ExtractedReferences,
) -> AppResult<ExportResponse> {
    let variables = &references.to_variables(variables);
    let result = process_shots_for_export(shots, config, variables)?;

    let mut unresolved: Vec<String> = Vec::new();
    for shot in shots {
        let scoped = variables.scoped_to(shot.chapter.as_deref(), shot.section.as_deref());
        for token in unresolved_tokens(&shot.description, &scoped) {
            if !unresolved.contains(&token) {
                unresolved.push(token);
            }
        }
    }

    tracing::info!(
        total_shots = result.total_shots,
        format = ?config.format,
        unresolved = unresolved.len(),
        "Exported shots"
    );

    Ok(ExportResponse {
        result,
        unresolved_tokens: unresolved,
    })
}

fn require_project_id(project_id: &str) -> Result<(), CoreError> {
    if project_id.trim().is_empty() {
        return Err(CoreError::Validation("projectId must not be empty".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// POST /export
// ---------------------------------------------------------------------------

/// Substitute variables, apply prefix/suffix and render the shots.
pub async fn export_shots(
    AppJson(input): AppJson<ExportRequest>,
) -> AppResult<impl IntoResponse> {
    let response = render(&input.shots, &input.config, input.variables, &input.references)?;
    Ok(Json(ApiResponse::ok(response)))
}

// ---------------------------------------------------------------------------
// POST /export/story
// ---------------------------------------------------------------------------

/// Flatten a story breakdown and export its shots.
pub async fn export_story(
    AppJson(input): AppJson<StoryExportRequest>,
) -> AppResult<impl IntoResponse> {
    require_project_id(&input.project_id)?;
    let shots = story_export_shots(&input.project_id, &input.chapters);
    let response = render(&shots, &input.config, input.variables, &input.references)?;
    Ok(Json(ApiResponse::ok(response)))
}

// ---------------------------------------------------------------------------
// POST /export/music-video
// ---------------------------------------------------------------------------

/// Flatten a music-video breakdown and export its shots.
pub async fn export_music_video(
    AppJson(input): AppJson<MusicVideoExportRequest>,
) -> AppResult<impl IntoResponse> {
    require_project_id(&input.project_id)?;
    let shots = music_video_export_shots(&input.project_id, &input.sections);
    let response = render(&shots, &input.config, input.variables, &input.references)?;
    Ok(Json(ApiResponse::ok(response)))
}
