//! JSON extraction from generator output.
//!
//! Models often wrap the requested JSON object in markdown fences or
//! conversational text. Extraction here is brace-balanced and aware of
//! string literals, so braces inside strings do not confuse it.

/// Return every balanced `{...}` object candidate in `text`, in order of
/// their opening brace.
///
/// Candidates are not validated as JSON; callers decode them and keep the
/// first that fits their shape.
pub fn brace_candidates(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices('{')
        .filter_map(move |(start, _)| extract_balanced_braces(&text[start..]))
}

/// Extract a substring with balanced braces starting at the first `{`.
///
/// Tracks brace depth while respecting JSON string literals (including
/// escaped characters), so `{"msg": "use { and } carefully"}` is handled
/// correctly.
pub fn extract_balanced_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let text = &text[start..];

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}
