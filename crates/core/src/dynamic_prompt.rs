//! Dynamic prompt expansion.
//!
//! Three syntaxes turn one prompt into several:
//!
//! - **Brackets**: `a [red, blue] car` expands to `a red car` and
//!   `a blue car`. Several groups multiply, in source order, up to
//!   [`MAX_VARIATIONS`].
//! - **Wildcards**: `_name_` is replaced by a random entry from the named
//!   list of a [`WildcardLibrary`]. Unknown names are left as written.
//! - **Pipelines**: `step one | step two` is a chain of prompts, each fed to
//!   the next generation.
//!
//! Brackets and pipelines cannot be combined in one prompt.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use rand::seq::IndexedRandom;
use rand::Rng;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Upper bound on generated variations per prompt.
pub const MAX_VARIATIONS: usize = 100;

/// Maximum prompt length in characters.
pub const MAX_PROMPT_LENGTH: usize = 10_000;

/// Named lists of values for `_wildcard_` substitution.
pub type WildcardLibrary = BTreeMap<String, Vec<String>>;

static BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]*)\]").expect("valid regex"));

/// `_name_` not glued to a preceding word character, so `snake_case_text`
/// is not a wildcard.
static WILDCARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^A-Za-z0-9_])_([A-Za-z0-9](?:[A-Za-z0-9_-]*[A-Za-z0-9])?)_")
        .expect("valid regex")
});

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a prompt was expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// No brackets or pipes; one prompt out.
    Single,
    /// Bracket groups expanded into variations.
    Variations,
    /// `|`-separated chain of steps.
    Pipeline,
}

/// Bracket expansion output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketExpansion {
    pub prompts: Vec<String>,
    /// Size of the full cartesian product, before capping.
    pub total_combinations: usize,
    pub truncated: bool,
}

/// Result of [`expand_prompt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicPromptResult {
    pub original: String,
    pub mode: PromptMode,
    pub prompts: Vec<String>,
    pub total_combinations: usize,
    pub truncated: bool,
    /// Wildcards with no library entry, left as written.
    pub unresolved_wildcards: Vec<String>,
}

// ---------------------------------------------------------------------------
// Brackets
// ---------------------------------------------------------------------------

enum Segment<'a> {
    Literal(&'a str),
    Options(Vec<&'a str>),
}

fn parse_segments(prompt: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for caps in BRACKET_RE.captures_iter(prompt) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(inner) = caps.get(1) else { continue };
        let options: Vec<&str> = inner
            .as_str()
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .collect();
        // A group with no options is ordinary text.
        if options.is_empty() {
            continue;
        }
        segments.push(Segment::Literal(&prompt[last..whole.start()]));
        segments.push(Segment::Options(options));
        last = whole.end();
    }
    segments.push(Segment::Literal(&prompt[last..]));
    segments
}

/// Expand every `[a, b, ...]` group into the cartesian product of options.
///
/// Options are trimmed and empty options dropped. Results are ordered with
/// the first group varying slowest, and capped at [`MAX_VARIATIONS`].
pub fn expand_brackets(prompt: &str) -> BracketExpansion {
    let segments = parse_segments(prompt);

    let total_combinations = segments
        .iter()
        .map(|s| match s {
            Segment::Options(options) => options.len(),
            Segment::Literal(_) => 1,
        })
        .fold(1usize, usize::saturating_mul);

    let mut prompts = vec![String::new()];
    for segment in &segments {
        match segment {
            Segment::Literal(text) => prompts.iter_mut().for_each(|p| p.push_str(text)),
            Segment::Options(options) => {
                prompts = prompts
                    .iter()
                    .flat_map(|p| options.iter().map(move |o| format!("{p}{o}")))
                    .take(MAX_VARIATIONS)
                    .collect();
            }
        }
    }

    BracketExpansion {
        prompts,
        total_combinations,
        truncated: total_combinations > MAX_VARIATIONS,
    }
}

// ---------------------------------------------------------------------------
// Wildcards
// ---------------------------------------------------------------------------

/// Replace each known `_name_` with a random entry from its list.
///
/// Each occurrence draws independently. Names are matched exactly; unknown
/// names and empty lists leave the wildcard untouched.
pub fn apply_wildcards<R: Rng + ?Sized>(
    prompt: &str,
    library: &WildcardLibrary,
    rng: &mut R,
) -> String {
    WILDCARD_RE
        .replace_all(prompt, |caps: &Captures| {
            let lead = &caps[1];
            match library.get(&caps[2]).and_then(|values| values.choose(rng)) {
                Some(value) => format!("{lead}{value}"),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Wildcard names referenced by `prompt`, in first-seen order.
pub fn wildcard_names(prompt: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in WILDCARD_RE.captures_iter(prompt) {
        let name = caps[2].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

/// Split a `|`-chained prompt into trimmed, non-empty steps.
pub fn split_pipeline(prompt: &str) -> Vec<String> {
    prompt
        .split('|')
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

/// Expand `prompt` using all three syntaxes.
///
/// Wildcards are drawn after bracket expansion, so every variation gets its
/// own draw.
pub fn expand_prompt<R: Rng + ?Sized>(
    prompt: &str,
    library: &WildcardLibrary,
    rng: &mut R,
) -> Result<DynamicPromptResult, CoreError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Prompt must not be empty".to_string()));
    }
    let length = trimmed.chars().count();
    if length > MAX_PROMPT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Prompt exceeds maximum length of {MAX_PROMPT_LENGTH} characters (got {length})"
        )));
    }

    let has_pipeline = trimmed.contains('|');
    let brackets = expand_brackets(trimmed);
    let has_brackets = parse_segments(trimmed)
        .iter()
        .any(|s| matches!(s, Segment::Options(_)));

    if has_pipeline && has_brackets {
        return Err(CoreError::Validation(
            "Bracket variations cannot be combined with a '|' pipeline".to_string(),
        ));
    }

    let (mode, raw_prompts, total_combinations, truncated) = if has_pipeline {
        let steps = split_pipeline(trimmed);
        if steps.is_empty() {
            return Err(CoreError::Validation(
                "Pipeline must contain at least one non-empty step".to_string(),
            ));
        }
        let count = steps.len();
        (PromptMode::Pipeline, steps, count, false)
    } else if has_brackets {
        (
            PromptMode::Variations,
            brackets.prompts,
            brackets.total_combinations,
            brackets.truncated,
        )
    } else {
        (PromptMode::Single, vec![trimmed.to_string()], 1, false)
    };

    let prompts: Vec<String> = raw_prompts
        .iter()
        .map(|p| apply_wildcards(p, library, rng))
        .collect();

    let unresolved_wildcards: Vec<String> = wildcard_names(trimmed)
        .into_iter()
        .filter(|name| library.get(name).is_none_or(Vec::is_empty))
        .collect();

    tracing::debug!(
        mode = ?mode,
        prompts = prompts.len(),
        total_combinations,
        truncated,
        "Expanded dynamic prompt"
    );

    Ok(DynamicPromptResult {
        original: prompt.to_string(),
        mode,
        prompts,
        total_combinations,
        truncated,
        unresolved_wildcards,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
