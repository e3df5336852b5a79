//! Handlers for reference extraction.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use palette_core::references::{find_reference_tags, ExtractedReferences};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExtractReferencesRequest {
    pub text: String,
}

/// Extracted references plus the `@tags` the text already uses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractReferencesResponse {
    #[serde(flatten)]
    pub references: ExtractedReferences,
    pub mentioned_tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// POST /references/extract
// ---------------------------------------------------------------------------

/// Identify characters, locations and props in narrative text.
pub async fn extract(
    State(state): State<AppState>,
    AppJson(input): AppJson<ExtractReferencesRequest>,
) -> AppResult<impl IntoResponse> {
    let client = state.openai.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("Reference extraction is not configured".into())
    })?;

    let references = client.extract_references(&input.text).await?;
    let mentioned_tags = find_reference_tags(&input.text);
    tracing::info!(
        references = references.len(),
        mentioned = mentioned_tags.len(),
        "Extracted references"
    );
    Ok(Json(ApiResponse::ok(ExtractReferencesResponse {
        references,
        mentioned_tags,
    })))
}
