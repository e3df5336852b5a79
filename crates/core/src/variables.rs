//! Variable substitution for shot descriptions.
//!
//! Shot descriptions reference configured values through `@tokens`:
//!
//! | Token          | Value                                              |
//! |----------------|----------------------------------------------------|
//! | `@artist`      | artist name (or description, see below)            |
//! | `@artist-desc` | artist description                                 |
//! | `@artist-tag`  | artist tag, derived from the name when unset       |
//! | `@director`    | director name                                      |
//! | `@chapter`     | chapter title                                      |
//! | `@section`     | section title                                      |
//! | `@location`    | location                                           |
//! | `@<reference>` | custom reference tag (character, location, prop)   |
//!
//! Matching is case-insensitive. A token is read greedily, hyphens
//! included, and resolved in this order:
//!
//! 1. an exact built-in name, so `@artist-desc` is never half-replaced as
//!    `@artist` followed by `-desc`;
//! 2. a custom reference;
//! 3. the longest built-in name followed by `-`, keeping the rest as text,
//!    so `@director-style` becomes `Jane Campion-style`.
//!
//! Tokens without a value are left verbatim. There is no escape syntax for
//! a literal `@word`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::artist_tag::create_artist_tag;

/// Regex pattern matching an `@token`, hyphenated segments included.
pub const TOKEN_PATTERN: &str = r"@([A-Za-z0-9_]+(?:-[A-Za-z0-9_]+)*)";

pub(crate) static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_PATTERN).expect("valid regex"));

/// Built-in token names, longest first.
const BUILTIN_TOKENS: [&str; 7] = [
    "artist-desc",
    "artist-tag",
    "director",
    "location",
    "chapter",
    "section",
    "artist",
];

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// Values available to `@token` substitution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportVariables {
    pub artist_name: Option<String>,
    pub artist_description: Option<String>,
    pub artist_tag: Option<String>,
    pub director: Option<String>,
    pub chapter: Option<String>,
    pub section: Option<String>,
    pub location: Option<String>,
    /// Custom reference tags keyed by normalized tag (no leading `@`).
    pub references: BTreeMap<String, String>,
}

impl ExportVariables {
    /// Add a custom reference, normalizing its tag.
    ///
    /// Tags that normalize to nothing are ignored.
    pub fn with_reference(mut self, tag: &str, value: impl Into<String>) -> Self {
        let key = create_artist_tag(tag.trim_start_matches('@'));
        if !key.is_empty() {
            self.references.insert(key, value.into());
        }
        self
    }

    /// Copy of these variables scoped to one shot's chapter and section.
    ///
    /// Shot-level values win over the configured ones.
    pub fn scoped_to(&self, chapter: Option<&str>, section: Option<&str>) -> Self {
        let mut scoped = self.clone();
        if let Some(chapter) = chapter {
            scoped.chapter = Some(chapter.to_string());
        }
        if let Some(section) = section {
            scoped.section = Some(section.to_string());
        }
        scoped
    }

    /// Resolve a token name (without `@`) to its replacement text.
    ///
    /// On failure, returns the lowercased token that lacks a value.
    fn substitute(&self, token: &str, use_artist_descriptions: bool) -> Result<String, String> {
        let lower = token.to_lowercase();
        if BUILTIN_TOKENS.contains(&lower.as_str()) {
            return self
                .resolve_builtin(&lower, use_artist_descriptions)
                .ok_or(lower);
        }
        if let Some(value) = self.resolve_reference(&lower) {
            return Ok(value);
        }

        // Tokens are ASCII, so byte offsets agree between `token` and `lower`.
        let Some(name) = BUILTIN_TOKENS.into_iter().find(|name| {
            lower
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('-'))
        }) else {
            return Err(lower);
        };
        let suffix = &token[name.len()..];
        self.resolve_builtin(name, use_artist_descriptions)
            .map(|value| format!("{value}{suffix}"))
            .ok_or_else(|| name.to_string())
    }

    fn resolve_builtin(&self, name: &str, use_artist_descriptions: bool) -> Option<String> {
        match name {
            "artist" => {
                let description = non_empty(&self.artist_description);
                if use_artist_descriptions && description.is_some() {
                    description
                } else {
                    non_empty(&self.artist_name)
                }
            }
            "artist-desc" => non_empty(&self.artist_description),
            "artist-tag" => non_empty(&self.artist_tag).or_else(|| {
                non_empty(&self.artist_name)
                    .map(|name| create_artist_tag(&name))
                    .filter(|tag| !tag.is_empty())
            }),
            "director" => non_empty(&self.director),
            "chapter" => non_empty(&self.chapter),
            "section" => non_empty(&self.section),
            "location" => non_empty(&self.location),
            _ => None,
        }
    }

    fn resolve_reference(&self, token: &str) -> Option<String> {
        self.references
            .get(&create_artist_tag(token))
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// Replace every resolvable `@token` in `description`.
///
/// With `use_artist_descriptions`, `@artist` resolves to the artist
/// description when one is configured. A description with no resolvable
/// token is returned unchanged.
pub fn replace_variables(
    description: &str,
    variables: &ExportVariables,
    use_artist_descriptions: bool,
) -> String {
    TOKEN_RE
        .replace_all(description, |caps: &Captures| {
            variables
                .substitute(&caps[1], use_artist_descriptions)
                .unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// List the distinct `@tokens` in `description` that have no value.
///
/// Tokens are returned with their `@`, lowercased, in first-seen order.
pub fn unresolved_tokens(description: &str, variables: &ExportVariables) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for caps in TOKEN_RE.captures_iter(description) {
        if let Err(name) = variables.substitute(&caps[1], false) {
            let token = format!("@{name}");
            if !missing.contains(&token) {
                missing.push(token);
            }
        }
    }
    missing
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn artist_vars() -> ExportVariables {
        ExportVariables {
            artist_name: Some("A$AP Rocky".to_string()),
            artist_description: Some("a rapper in a fur coat".to_string()),
            director: Some("Spike Jonze".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn replaces_builtin_tokens_case_insensitively() {
        let out = replace_variables(
            "@Artist dances while @DIRECTOR watches",
            &artist_vars(),
            false,
        );
        assert_eq!(out, "A$AP Rocky dances while Spike Jonze watches");
    }

    #[test]
    fn artist_desc_is_not_corrupted_by_artist() {
        let out = replace_variables("@artist-desc, then @artist", &artist_vars(), false);
        assert_eq!(out, "a rapper in a fur coat, then A$AP Rocky");
    }

    #[test]
    fn missing_description_leaves_artist_desc_verbatim() {
        let vars = ExportVariables {
            artist_name: Some("Bjork".to_string()),
            ..Default::default()
        };
        let out = replace_variables("@artist-desc near @artist", &vars, false);
        assert_eq!(out, "@artist-desc near Bjork");
    }

    #[test]
    fn use_artist_descriptions_swaps_artist_value() {
        let out = replace_variables("portrait of @artist", &artist_vars(), true);
        assert_eq!(out, "portrait of a rapper in a fur coat");
    }

    #[test]
    fn use_artist_descriptions_falls_back_to_name() {
        let vars = ExportVariables {
            artist_name: Some("Bjork".to_string()),
            ..Default::default()
        };
        assert_eq!(replace_variables("@artist", &vars, true), "Bjork");
    }

    #[test]
    fn artist_tag_is_derived_from_name() {
        let out = replace_variables("tag: @artist-tag", &artist_vars(), false);
        assert_eq!(out, "tag: asap_rocky");
    }

    #[test]
    fn explicit_artist_tag_wins() {
        let vars = ExportVariables {
            artist_tag: Some("rocky".to_string()),
            ..artist_vars()
        };
        assert_eq!(replace_variables("@artist-tag", &vars, false), "rocky");
    }

    #[test]
    fn unmatched_tokens_stay_verbatim() {
        let out = replace_variables("@unknown meets @artist", &artist_vars(), false);
        assert_eq!(out, "@unknown meets A$AP Rocky");
    }

    #[test]
    fn identity_when_nothing_matches() {
        let text = "@hero walks to @old_mill at dawn, mail me at me@example.com";
        assert_eq!(replace_variables(text, &ExportVariables::default(), true), text);
        assert_eq!(replace_variables(text, &artist_vars(), false), text);
    }

    #[test]
    fn empty_values_count_as_missing() {
        let vars = ExportVariables {
            director: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(replace_variables("@director", &vars, false), "@director");
    }

    #[test]
    fn longer_word_is_a_different_token() {
        let out = replace_variables("@artistry and @artist's coat", &artist_vars(), false);
        assert_eq!(out, "@artistry and A$AP Rocky's coat");
    }

    #[test]
    fn hyphenated_suffix_keeps_builtin() {
        let vars = ExportVariables {
            artist_name: Some("Lorde".to_string()),
            director: Some("Jane Campion".to_string()),
            ..Default::default()
        };
        let out = replace_variables(
            "@artist-inspired wardrobe, @Director-Style framing",
            &vars,
            false,
        );
        assert_eq!(out, "Lorde-inspired wardrobe, Jane Campion-Style framing");
    }

    #[test]
    fn longest_builtin_prefix_wins() {
        let out = replace_variables("@artist-desc-like pose", &artist_vars(), false);
        assert_eq!(out, "a rapper in a fur coat-like pose");
    }

    #[test]
    fn hyphenated_reference_beats_builtin_prefix() {
        let vars = artist_vars().with_reference("artist-double", "a stand-in");
        assert_eq!(replace_variables("@artist-double", &vars, false), "a stand-in");
    }

    #[test]
    fn unresolved_hyphenated_builtin_reports_builtin_name() {
        let vars = ExportVariables::default();
        assert_eq!(
            replace_variables("@director-style", &vars, false),
            "@director-style"
        );
        assert_eq!(unresolved_tokens("@director-style", &vars), vec!["@director"]);
    }

    #[test]
    fn substitutes_custom_references() {
        let vars = ExportVariables::default()
            .with_reference("@Hero", "a tall woman in a red cloak")
            .with_reference("Old Mill", "a crumbling stone mill");
        let out = replace_variables("@hero enters @old-mill", &vars, false);
        assert_eq!(out, "a tall woman in a red cloak enters a crumbling stone mill");
    }

    #[test]
    fn builtins_shadow_references() {
        let vars = ExportVariables {
            location: Some("Paris".to_string()),
            ..Default::default()
        }
        .with_reference("location", "ignored");
        assert_eq!(replace_variables("@location", &vars, false), "Paris");
    }

    #[test]
    fn scoped_variables_take_shot_chapter() {
        let vars = ExportVariables {
            chapter: Some("Global".to_string()),
            ..Default::default()
        };
        let scoped = vars.scoped_to(Some("Chapter 2"), None);
        assert_eq!(replace_variables("@chapter", &scoped, false), "Chapter 2");
        assert_eq!(replace_variables("@section", &scoped, false), "@section");
    }

    #[test]
    fn lists_unresolved_tokens_once() {
        let missing = unresolved_tokens("@Hero @artist @hero @director", &artist_vars());
        assert_eq!(missing, vec!["@hero".to_string()]);
    }
}
