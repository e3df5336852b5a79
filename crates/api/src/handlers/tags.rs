//! Handlers for artist-tag normalization.

use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use palette_core::artist_tag::create_artist_tag;
use palette_core::error::CoreError;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct ArtistTagRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ArtistTagResponse {
    pub name: String,
    pub tag: String,
    /// The tag as it is written in shot descriptions.
    pub reference: String,
}

// ---------------------------------------------------------------------------
// POST /tags/artist
// ---------------------------------------------------------------------------

/// Normalize an artist name into its tag.
pub async fn create_tag(
    AppJson(input): AppJson<ArtistTagRequest>,
) -> AppResult<impl IntoResponse> {
    let tag = create_artist_tag(&input.name);
    if tag.is_empty() {
        return Err(CoreError::Validation(format!(
            "'{}' contains no characters usable in a tag",
            input.name
        ))
        .into());
    }

    Ok(Json(ApiResponse::ok(ArtistTagResponse {
        reference: format!("@{tag}"),
        name: input.name,
        tag,
    })))
}
