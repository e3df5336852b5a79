//! Artist-tag normalization.
//!
//! Turns free-form artist (or character/location/prop) names into the
//! lowercase snake_case identifiers used after `@` in shot descriptions.

/// Characters that separate words inside a name.
const WORD_SEPARATORS: &[char] = &['-', '_', '.', '/'];

/// Normalize a display name into a tag identifier.
///
/// Rules:
/// - lowercase;
/// - `$` reads as `s`, `&` reads as `and`;
/// - whitespace and `- _ . /` separate words, joined by a single `_`;
/// - any other non-alphanumeric character is dropped;
/// - no leading, trailing or repeated underscores.
///
/// The output is lowercase alphanumerics joined by single underscores, so
/// applying the function again returns it unchanged.
///
/// ```
/// use palette_core::artist_tag::create_artist_tag;
///
/// assert_eq!(create_artist_tag("A$AP Rocky"), "asap_rocky");
/// assert_eq!(create_artist_tag("Simon & Garfunkel"), "simon_and_garfunkel");
/// ```
pub fn create_artist_tag(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in name.chars() {
        if ch.is_whitespace() || WORD_SEPARATORS.contains(&ch) {
            flush_word(&mut words, &mut current);
        } else if ch == '&' {
            flush_word(&mut words, &mut current);
            words.push("and".to_string());
        } else if ch == '$' {
            current.push('s');
        } else if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase().filter(|c| c.is_alphanumeric()));
        }
    }
    flush_word(&mut words, &mut current);

    words.join("_")
}

/// Normalize a name into an `@tag` reference.
///
/// Returns `None` when nothing taggable is left after normalization.
pub fn to_reference_tag(name: &str) -> Option<String> {
    let tag = create_artist_tag(name.trim_start_matches('@'));
    if tag.is_empty() {
        None
    } else {
        Some(format!("@{tag}"))
    }
}

fn flush_word(words: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
