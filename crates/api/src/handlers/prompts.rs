//! Handlers for dynamic prompt expansion.

use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use palette_core::dynamic_prompt::{expand_prompt, WildcardLibrary};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct ExpandPromptRequest {
    pub prompt: String,
    #[serde(default)]
    pub wildcards: WildcardLibrary,
}

// ---------------------------------------------------------------------------
// POST /prompts/expand
// ---------------------------------------------------------------------------

/// Expand brackets, wildcards and pipelines in a prompt.
pub async fn expand(
    AppJson(input): AppJson<ExpandPromptRequest>,
) -> AppResult<impl IntoResponse> {
    let result = expand_prompt(&input.prompt, &input.wildcards, &mut rand::rng())?;
    Ok(Json(ApiResponse::ok(result)))
}
