//! Reference extraction: prompt construction and response parsing.
//!
//! Identifying characters, locations and props in narrative text is done by
//! a language model. This module owns everything around that call: the
//! prompt, pulling JSON out of the reply, and normalizing the tags so they
//! can be used as `@tokens` during export.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::artist_tag::to_reference_tag;
use crate::error::CoreError;
use crate::variables::{ExportVariables, TOKEN_RE};

/// Maximum narrative length accepted for extraction, in characters.
pub const MAX_EXTRACTION_TEXT_LENGTH: usize = 50_000;

const EXTRACTION_SYSTEM_PROMPT: &str = "You identify the recurring visual elements of a story \
or song so they can be referenced consistently across generated shots. Reply with JSON only, \
no commentary, using exactly this shape: \
{\"characters\": [{\"name\": string, \"tag\": string, \"description\": string}], \
\"locations\": [...], \"props\": [...]}. \
Tags are lowercase snake_case prefixed with @, for example @old_lighthouse. \
Descriptions are short visual descriptions suitable for an image prompt.";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One named element with its `@tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub name: String,
    /// Normalized tag including the leading `@`.
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Elements found in a piece of narrative, by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedReferences {
    pub characters: Vec<Reference>,
    pub locations: Vec<Reference>,
    pub props: Vec<Reference>,
}

impl ExtractedReferences {
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.locations.is_empty() && self.props.is_empty()
    }

    pub fn len(&self) -> usize {
        self.characters.len() + self.locations.len() + self.props.len()
    }

    /// All references, characters first.
    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.characters
            .iter()
            .chain(self.locations.iter())
            .chain(self.props.iter())
    }

    /// Merge into `variables` as custom references.
    ///
    /// Each tag maps to its description, or to its name when the model gave
    /// no description. Earlier categories win on tag collisions.
    pub fn to_variables(&self, variables: ExportVariables) -> ExportVariables {
        let mut seen = HashSet::new();
        self.iter()
            .filter(|r| seen.insert(r.tag.as_str()))
            .fold(variables, |vars, r| {
                let value = r
                    .description
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or(&r.name);
                vars.with_reference(&r.tag, value)
            })
    }
}

/// A chat prompt as a system/user pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionPrompt {
    pub system: String,
    pub user: String,
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// Build the extraction prompt for `text`.
pub fn build_extraction_prompt(text: &str) -> Result<ExtractionPrompt, CoreError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CoreError::Validation(
            "Text to extract references from must not be empty".to_string(),
        ));
    }
    let length = text.chars().count();
    if length > MAX_EXTRACTION_TEXT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Text exceeds maximum length of {MAX_EXTRACTION_TEXT_LENGTH} characters (got {length})"
        )));
    }

    Ok(ExtractionPrompt {
        system: EXTRACTION_SYSTEM_PROMPT.to_string(),
        user: format!("Extract the characters, locations and props from this text:\n\n{text}"),
    })
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawExtraction {
    characters: Vec<RawReference>,
    locations: Vec<RawReference>,
    props: Vec<RawReference>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawReference {
    name: String,
    tag: Option<String>,
    description: Option<String>,
}

/// Parse a model reply into normalized references.
///
/// Accepts bare JSON, JSON inside a fenced code block, or JSON surrounded
/// by prose. Entries without a usable name or tag are dropped, and a tag
/// appears at most once per category.
pub fn parse_extraction_response(raw: &str) -> Result<ExtractedReferences, CoreError> {
    let json = extract_json_object(raw).ok_or_else(|| {
        tracing::warn!(response_length = raw.len(), "No JSON object in extraction reply");
        CoreError::Validation("Reference extraction reply contained no JSON object".to_string())
    })?;

    let parsed: RawExtraction = serde_json::from_str(json)?;

    let extracted = ExtractedReferences {
        characters: normalize_category(parsed.characters),
        locations: normalize_category(parsed.locations),
        props: normalize_category(parsed.props),
    };
    tracing::debug!(
        characters = extracted.characters.len(),
        locations = extracted.locations.len(),
        props = extracted.props.len(),
        "Parsed extracted references"
    );
    Ok(extracted)
}

fn normalize_category(raw: Vec<RawReference>) -> Vec<Reference> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(|r| {
            let name = r.name.trim().to_string();
            let tag = r
                .tag
                .as_deref()
                .and_then(to_reference_tag)
                .or_else(|| to_reference_tag(&name))?;
            let name = if name.is_empty() {
                tag.trim_start_matches('@').replace('_', " ")
            } else {
                name
            };
            let description = r
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty());
            Some(Reference {
                name,
                tag,
                description,
            })
        })
        .filter(|r| seen.insert(r.tag.clone()))
        .collect()
}

/// Slice out the JSON object in an LLM reply.
fn extract_json_object(raw: &str) -> Option<&str> {
    let body = code_block_body(raw).unwrap_or(raw);
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start < end).then(|| &body[start..=end])
}

fn code_block_body(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after_fence = &raw[open + 3..];
    // Skip the info string (`json`, `JSON`, or nothing).
    let content_start = after_fence.find('\n')? + 1;
    let content = &after_fence[content_start..];
    let close = content.find("```")?;
    Some(&content[..close])
}

// ---------------------------------------------------------------------------
// Tag discovery
// ---------------------------------------------------------------------------

/// Distinct `@tags` in `text`, lowercased, in first-seen order.
pub fn find_reference_tags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
