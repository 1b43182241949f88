//! Text Preprocessor
//!
//! Normalizes free-text entity fields into a single canonical string
//! suitable for embedding. Pure functions only: no I/O, no randomness,
//! no access to the clock.

/// Maximum length (in chars) of a canonical text string.
pub const MAX_CANONICAL_LEN: usize = 2048;

/// Collapse a run of HTML-like markers and whitespace, lowercase the
/// result. Does not touch punctuation otherwise.
fn normalize_field(field: &str) -> Option<String> {
    let stripped = strip_markup(field);
    let collapsed = collapse_whitespace(&stripped);
    let lowered = collapsed.to_lowercase();
    let trimmed = lowered.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Strip `<...>`-style markers. Not a full HTML parser: markers are
/// dropped so that malformed markup does not need to round-trip cleanly.
fn strip_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut depth = 0u32;
    for c in input.chars() {
        match c {
            '<' => depth += 1,
            '>' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = false;
    for c in input.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

fn truncate_chars(input: String, max_len: usize) -> String {
    if input.chars().count() <= max_len {
        input
    } else {
        input.chars().take(max_len).collect()
    }
}

/// Join normalized, non-empty fields with " | ", then truncate.
///
/// `tags`, if present, must already be sorted lexicographically by the
/// caller (callers pass an already-joined tag string as one field so
/// that the general field-joining logic stays unaware of tag ordering).
fn canonicalize(fields: &[Option<&str>]) -> String {
    let joined = fields
        .iter()
        .filter_map(|f| f.and_then(normalize_field))
        .collect::<Vec<_>>()
        .join(" | ");
    truncate_chars(joined, MAX_CANONICAL_LEN)
}

fn sorted_tags(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let mut sorted: Vec<&str> = tags.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    Some(sorted.join(", "))
}

/// Canonical text for an event: title; category; tags; description; location.
pub fn canonical_event_text(
    title: &str,
    category: &str,
    tags: &[String],
    description: Option<&str>,
    location: Option<&str>,
) -> String {
    let tag_field = sorted_tags(tags);
    canonicalize(&[
        Some(title),
        Some(category),
        tag_field.as_deref(),
        description,
        location,
    ])
}

/// Canonical text for a user: bio; interests; location.
pub fn canonical_user_text(bio: Option<&str>, interests: &[String], location: Option<&str>) -> String {
    let interest_field = sorted_tags(interests);
    canonicalize(&[bio, interest_field.as_deref(), location])
}
