//! Breakdown conversion.
//!
//! A breakdown is the chapter (story) or section (music video) tree an
//! LLM produces from the source text. These functions flatten it into
//! [`PostProductionShot`] records for the transfer bridge, or into plain
//! [`ShotData`] for export.
//!
//! Shot ids are deterministic: `{prefix}_{project_id}_{group_id}_{index}`
//! with a zero-based index inside the chapter or section, so converting the
//! same breakdown twice yields the same ids.

use serde::{Deserialize, Serialize};

use crate::shot::{
    PostProductionShot, ProjectType, ShotData, ShotMetadata, ShotStatus, SourceType,
};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Breakdown inputs
// ---------------------------------------------------------------------------

/// One shot as it appears inside a breakdown.
///
/// Older breakdowns carry the text in `prompt` instead of `description`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownShot {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub shot_number: Option<u32>,
    #[serde(default)]
    pub director_style: Option<String>,
}

impl BreakdownShot {
    /// The shot text, preferring `description` over `prompt`.
    pub fn text(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(self.prompt.as_deref())
            .unwrap_or_default()
    }
}

/// A chapter of a story breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryChapter {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub shots: Vec<BreakdownShot>,
}

/// A section (verse, chorus, bridge...) of a music-video breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicVideoSection {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub section_type: Option<String>,
    #[serde(default)]
    pub shots: Vec<BreakdownShot>,
}

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Build the deterministic id for a converted shot.
pub fn shot_id(project_type: ProjectType, project_id: &str, group_id: &str, index: usize) -> String {
    format!("{}_{project_id}_{group_id}_{index}", project_type.id_prefix())
}

// ---------------------------------------------------------------------------
// Conversion to post-production shots
// ---------------------------------------------------------------------------

/// Flatten story chapters into post-production shots.
pub fn convert_story_shots(
    project_id: &str,
    chapters: &[StoryChapter],
    created_at: Timestamp,
) -> Vec<PostProductionShot> {
    chapters
        .iter()
        .flat_map(|chapter| {
            chapter.shots.iter().enumerate().map(move |(index, shot)| {
                let data = build_shot_data(
                    shot_id(ProjectType::Story, project_id, &chapter.id, index),
                    shot,
                    index,
                    SourceType::Story,
                    created_at,
                );
                PostProductionShot {
                    shot: ShotData {
                        chapter: Some(group_label(&chapter.id, chapter.title.as_deref())),
                        ..data
                    },
                    project_id: project_id.to_string(),
                    project_type: ProjectType::Story,
                    status: ShotStatus::Pending,
                    source_chapter: Some(chapter.id.clone()),
                    source_section: None,
                    created_at,
                }
            })
        })
        .collect()
}

/// Flatten music-video sections into post-production shots.
pub fn convert_music_video_shots(
    project_id: &str,
    sections: &[MusicVideoSection],
    created_at: Timestamp,
) -> Vec<PostProductionShot> {
    sections
        .iter()
        .flat_map(|section| {
            section.shots.iter().enumerate().map(move |(index, shot)| {
                let data = build_shot_data(
                    shot_id(ProjectType::MusicVideo, project_id, &section.id, index),
                    shot,
                    index,
                    SourceType::MusicVideo,
                    created_at,
                );
                PostProductionShot {
                    shot: ShotData {
                        section: Some(group_label(&section.id, section.title.as_deref())),
                        ..data
                    },
                    project_id: project_id.to_string(),
                    project_type: ProjectType::MusicVideo,
                    status: ShotStatus::Pending,
                    source_chapter: None,
                    source_section: Some(section.id.clone()),
                    created_at,
                }
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Conversion to export shots
// ---------------------------------------------------------------------------

/// Flatten story chapters into export-ready shots (no project bookkeeping).
pub fn story_export_shots(project_id: &str, chapters: &[StoryChapter]) -> Vec<ShotData> {
    chapters
        .iter()
        .flat_map(|chapter| {
            chapter.shots.iter().enumerate().map(move |(index, shot)| ShotData {
                id: shot_id(ProjectType::Story, project_id, &chapter.id, index),
                description: shot.text().to_string(),
                chapter: Some(group_label(&chapter.id, chapter.title.as_deref())),
                section: None,
                shot_number: Some(shot.shot_number.unwrap_or(index as u32 + 1)),
                metadata: export_metadata(shot, SourceType::Story),
            })
        })
        .collect()
}

/// Flatten music-video sections into export-ready shots.
pub fn music_video_export_shots(project_id: &str, sections: &[MusicVideoSection]) -> Vec<ShotData> {
    sections
        .iter()
        .flat_map(|section| {
            section.shots.iter().enumerate().map(move |(index, shot)| ShotData {
                id: shot_id(ProjectType::MusicVideo, project_id, &section.id, index),
                description: shot.text().to_string(),
                chapter: None,
                section: Some(group_label(&section.id, section.title.as_deref())),
                shot_number: Some(shot.shot_number.unwrap_or(index as u32 + 1)),
                metadata: export_metadata(shot, SourceType::MusicVideo),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_shot_data(
    id: String,
    shot: &BreakdownShot,
    index: usize,
    source_type: SourceType,
    created_at: Timestamp,
) -> ShotData {
    ShotData {
        id,
        description: shot.text().to_string(),
        chapter: None,
        section: None,
        shot_number: Some(shot.shot_number.unwrap_or(index as u32 + 1)),
        metadata: Some(ShotMetadata {
            director_style: shot.director_style.clone(),
            timestamp: Some(created_at),
            source_type: Some(source_type),
        }),
    }
}

fn export_metadata(shot: &BreakdownShot, source_type: SourceType) -> Option<ShotMetadata> {
    Some(ShotMetadata {
        director_style: shot.director_style.clone(),
        timestamp: None,
        source_type: Some(source_type),
    })
}

/// Human label for a chapter or section: its title when set, else its id.
fn group_label(id: &str, title: Option<&str>) -> String {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(id)
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
