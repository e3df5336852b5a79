//! Prefix/suffix composition for exported shot descriptions.

/// Wrap `description` with a trimmed `prefix` and `suffix`.
///
/// A single space is inserted between non-empty parts whose boundary does
/// not already contain whitespace. Empty or whitespace-only prefix/suffix are no-ops, so
/// `apply_prefix_suffix(d, "", "") == d` for every `d`.
pub fn apply_prefix_suffix(description: &str, prefix: &str, suffix: &str) -> String {
    let prefix = prefix.trim();
    let suffix = suffix.trim();

    let mut result = String::with_capacity(description.len() + prefix.len() + suffix.len() + 2);

    if !prefix.is_empty() {
        result.push_str(prefix);
        if !description.is_empty() && !description.starts_with(char::is_whitespace) {
            result.push(' ');
        }
    }

    result.push_str(description);

    if !suffix.is_empty() {
        if !result.is_empty() && !result.ends_with(char::is_whitespace) {
            result.push(' ');
        }
        result.push_str(suffix);
    }

    result
}
