//! Shot export: substitution, composition and serialization.
//!
//! [`process_shots_for_export`] runs every shot through variable
//! substitution and prefix/suffix composition, then renders the whole list
//! in one of four formats chosen by [`ExportConfig::format`].

use serde::{Deserialize, Serialize};

use crate::compose::apply_prefix_suffix;
use crate::error::CoreError;
use crate::shot::{ShotData, ShotMetadata};
use crate::types::Timestamp;
use crate::variables::{replace_variables, ExportVariables};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a configured prefix or suffix in characters.
pub const MAX_AFFIX_LENGTH: usize = 1_000;

/// Maximum length of a configured separator in characters.
pub const MAX_SEPARATOR_LENGTH: usize = 16;

/// Default separator between rendered shots.
pub const DEFAULT_SEPARATOR: &str = "\n";

/// Maximum number of shots in one export.
pub const MAX_EXPORT_SHOTS: usize = 1_000;

/// CSV header row. Every column is quoted.
pub const CSV_HEADER: &str =
    r#""Shot Number","Description","Chapter","Section","Director Style""#;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Output format of an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Text,
    Numbered,
    Json,
    Csv,
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    pub prefix: String,
    pub suffix: String,
    /// Resolve `@artist` to the artist description instead of the name.
    pub use_artist_descriptions: bool,
    pub format: ExportFormat,
    /// Joins rendered shots in text and numbered formats.
    pub separator: String,
    pub include_metadata: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            use_artist_descriptions: false,
            format: ExportFormat::Text,
            separator: DEFAULT_SEPARATOR.to_string(),
            include_metadata: false,
        }
    }
}

/// Validate an export configuration.
pub fn validate_export_config(config: &ExportConfig) -> Result<(), CoreError> {
    for (name, value) in [("Prefix", &config.prefix), ("Suffix", &config.suffix)] {
        let len = value.chars().count();
        if len > MAX_AFFIX_LENGTH {
            return Err(CoreError::Validation(format!(
                "{name} exceeds maximum length of {MAX_AFFIX_LENGTH} characters (got {len})"
            )));
        }
    }
    let separator_len = config.separator.chars().count();
    if separator_len > MAX_SEPARATOR_LENGTH {
        return Err(CoreError::Validation(format!(
            "Separator exceeds maximum length of {MAX_SEPARATOR_LENGTH} characters (got {separator_len})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One shot after substitution and composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedShot {
    pub id: String,
    pub shot_number: u32,
    pub original_description: String,
    pub processed_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ShotMetadata>,
}

impl ProcessedShot {
    fn director_style(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.director_style.as_deref())
    }
}

/// Output of [`process_shots_for_export`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub shots: Vec<ProcessedShot>,
    pub formatted_text: String,
    pub total_shots: usize,
}

/// JSON export envelope.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    shots: Vec<JsonShot<'a>>,
    total_shots: usize,
    export_config: &'a ExportConfig,
    exported_at: Timestamp,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonShot<'a> {
    id: &'a str,
    shot_number: u32,
    description: &'a str,
    original_description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    chapter: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    section: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a ShotMetadata>,
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

/// Process and render `shots` for export, stamped with the current time.
pub fn process_shots_for_export(
    shots: &[ShotData],
    config: &ExportConfig,
    variables: &ExportVariables,
) -> Result<ExportResult, CoreError> {
    process_shots_for_export_at(shots, config, variables, chrono::Utc::now())
}

/// Process and render `shots` with an explicit export timestamp.
///
/// An empty shot list renders to an empty string in every format.
pub fn process_shots_for_export_at(
    shots: &[ShotData],
    config: &ExportConfig,
    variables: &ExportVariables,
    exported_at: Timestamp,
) -> Result<ExportResult, CoreError> {
    validate_export_config(config)?;
    if shots.len() > MAX_EXPORT_SHOTS {
        return Err(CoreError::Validation(format!(
            "Export exceeds maximum of {MAX_EXPORT_SHOTS} shots (got {})",
            shots.len()
        )));
    }

    let processed: Vec<ProcessedShot> = shots
        .iter()
        .enumerate()
        .map(|(index, shot)| process_shot(shot, index, config, variables))
        .collect();

    let formatted_text = if processed.is_empty() {
        String::new()
    } else {
        match config.format {
            ExportFormat::Text => render_text(&processed, config),
            ExportFormat::Numbered => render_numbered(&processed, config),
            ExportFormat::Json => render_json(&processed, config, exported_at)?,
            ExportFormat::Csv => render_csv(&processed),
        }
    };

    tracing::debug!(
        total_shots = processed.len(),
        format = ?config.format,
        "Processed shots for export"
    );

    Ok(ExportResult {
        total_shots: processed.len(),
        shots: processed,
        formatted_text,
    })
}

fn process_shot(
    shot: &ShotData,
    index: usize,
    config: &ExportConfig,
    variables: &ExportVariables,
) -> ProcessedShot {
    let scoped = variables.scoped_to(shot.chapter.as_deref(), shot.section.as_deref());
    let substituted = replace_variables(&shot.description, &scoped, config.use_artist_descriptions);
    let processed_description = apply_prefix_suffix(&substituted, &config.prefix, &config.suffix);

    ProcessedShot {
        id: shot.id.clone(),
        shot_number: shot.shot_number.unwrap_or(index as u32 + 1),
        original_description: shot.description.clone(),
        processed_description,
        chapter: shot.chapter.clone(),
        section: shot.section.clone(),
        metadata: shot.metadata.clone(),
    }
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

fn render_text(shots: &[ProcessedShot], config: &ExportConfig) -> String {
    shots
        .iter()
        .map(|shot| with_metadata_label(shot, config))
        .collect::<Vec<_>>()
        .join(&config.separator)
}

fn render_numbered(shots: &[ProcessedShot], config: &ExportConfig) -> String {
    shots
        .iter()
        .enumerate()
        .map(|(i, shot)| format!("{}. {}", i + 1, with_metadata_label(shot, config)))
        .collect::<Vec<_>>()
        .join(&config.separator)
}

fn render_json(
    shots: &[ProcessedShot],
    config: &ExportConfig,
    exported_at: Timestamp,
) -> Result<String, CoreError> {
    let envelope = JsonExport {
        shots: shots
            .iter()
            .map(|shot| JsonShot {
                id: &shot.id,
                shot_number: shot.shot_number,
                description: &shot.processed_description,
                original_description: &shot.original_description,
                chapter: shot.chapter.as_deref(),
                section: shot.section.as_deref(),
                metadata: shot.metadata.as_ref().filter(|_| config.include_metadata),
            })
            .collect(),
        total_shots: shots.len(),
        export_config: config,
        exported_at,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

fn render_csv(shots: &[ProcessedShot]) -> String {
    let mut lines = Vec::with_capacity(shots.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for shot in shots {
        let row = [
            shot.shot_number.to_string(),
            shot.processed_description.clone(),
            shot.chapter.clone().unwrap_or_default(),
            shot.section.clone().unwrap_or_default(),
            shot.director_style().unwrap_or_default().to_string(),
        ];
        lines.push(
            row.iter()
                .map(|field| csv_quote(field))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    lines.join("\n")
}

/// Quote a CSV field, doubling embedded quotes. Newlines are not escaped.
fn csv_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Prefix the description with `[Chapter .. | Section .. | Style ..]`
/// when metadata output is enabled and the shot has any of them.
fn with_metadata_label(shot: &ProcessedShot, config: &ExportConfig) -> String {
    if !config.include_metadata {
        return shot.processed_description.clone();
    }

    let mut parts = Vec::new();
    if let Some(chapter) = &shot.chapter {
        parts.push(format!("Chapter {chapter}"));
    }
    if let Some(section) = &shot.section {
        parts.push(format!("Section {section}"));
    }
    if let Some(style) = shot.director_style() {
        parts.push(format!("Style {style}"));
    }

    if parts.is_empty() {
        shot.processed_description.clone()
    } else {
        format!("[{}] {}", parts.join(" | "), shot.processed_description)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
