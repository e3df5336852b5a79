//! Shot records shared by the export and transfer pipelines.
//!
//! A [`ShotData`] is the unit every exporter works on. A
//! [`PostProductionShot`] wraps one with the project bookkeeping needed
//! once shots leave the breakdown view for generation.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Shot data
// ---------------------------------------------------------------------------

/// Where a shot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    Story,
    MusicVideo,
    Commercial,
    ChildrenBook,
}

/// Optional provenance attached to a shot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
}

/// A single shot description, possibly containing `@tokens`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotData {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ShotMetadata>,
}

impl ShotData {
    /// Create a bare shot with only an id and a description.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            chapter: None,
            section: None,
            shot_number: None,
            metadata: None,
        }
    }

    /// Director style from the metadata, if any.
    pub fn director_style(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.director_style.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Post-production shots
// ---------------------------------------------------------------------------

/// The kind of project a post-production shot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectType {
    Story,
    MusicVideo,
}

impl ProjectType {
    /// Prefix used when building deterministic shot ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            ProjectType::Story => "story",
            ProjectType::MusicVideo => "music-video",
        }
    }
}

/// Generation status of a post-production shot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

/// A shot handed over from a breakdown to the post-production stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostProductionShot {
    #[serde(flatten)]
    pub shot: ShotData,
    pub project_id: String,
    pub project_type: ProjectType,
    #[serde(default)]
    pub status: ShotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_section: Option<String>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shot_serializes_camel_case_and_skips_empty_fields() {
        let mut shot = ShotData::new("s1", "Wide shot of @artist");
        shot.shot_number = Some(3);

        let json = serde_json::to_value(&shot).unwrap();
        assert_eq!(json["shotNumber"], 3);
        assert!(json.get("chapter").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn post_production_shot_flattens_shot_fields() {
        let shot = PostProductionShot {
            shot: ShotData::new("story_p1_c1_0", "Close-up"),
            project_id: "p1".to_string(),
            project_type: ProjectType::MusicVideo,
            status: ShotStatus::Pending,
            source_chapter: None,
            source_section: Some("chorus".to_string()),
            created_at: chrono::Utc::now(),
        };

        let json = serde_json::to_value(&shot).unwrap();
        assert_eq!(json["id"], "story_p1_c1_0");
        assert_eq!(json["projectType"], "music-video");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["sourceSection"], "chorus");
    }

    #[test]
    fn director_style_reads_through_metadata() {
        let mut shot = ShotData::new("s1", "x");
        assert_eq!(shot.director_style(), None);

        shot.metadata = Some(ShotMetadata {
            director_style: Some("Wes Anderson".to_string()),
            ..Default::default()
        });
        assert_eq!(shot.director_style(), Some("Wes Anderson"));
    }
}
