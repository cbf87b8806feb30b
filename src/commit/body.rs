//! Commit body cleanup and default body synthesis.

use std::path::Path;

/// Body used when nothing is known about the change.
pub const GENERIC_BODY: &str = "Update code with necessary changes";

/// Template fragments that mark an unfilled body.
const PLACEHOLDER_MARKERS: &[&str] = &["<descriptive body", "<commit message>", "<optional body>"];

/// Body phrasing per file kind. `{name}` is replaced by the file name.
const KIND_TEMPLATES: &[(&[&str], &str)] = &[
    (&["go"], "Update {name} with improved Go code implementation"),
    (
        &["js", "jsx", "ts", "tsx"],
        "Enhance {name} with better JavaScript/TypeScript functionality",
    ),
    (&["py"], "Update Python implementation in {name}"),
    (&["rs"], "Update Rust implementation in {name}"),
    (&["md", "markdown"], "Improve documentation in {name}"),
    (&["css", "scss", "sass"], "Update styles in {name}"),
    (&["html"], "Update HTML template in {name}"),
    (&["json", "yaml", "yml", "toml"], "Update configuration in {name}"),
];

/// Deterministic body describing `files`.
pub fn default_body(files: &[String]) -> String {
    match files {
        [] => GENERIC_BODY.to_string(),
        [file] => {
            let path = Path::new(file.trim());
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file.trim().to_string());
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_default();

            KIND_TEMPLATES
                .iter()
                .find(|(exts, _)| exts.contains(&ext.as_str()))
                .map(|(_, template)| template.replace("{name}", &name))
                .unwrap_or_else(|| format!("Update {name} file"))
        }
        many => format!("Update {} files with necessary changes", many.len()),
    }
}

/// Whether `body` is still template placeholder text.
pub fn is_placeholder(body: &str) -> bool {
    let lower = body.to_lowercase();
    PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m))
}

/// Strip fences, markers and labels from a parsed body.
///
/// Returns `None` when nothing meaningful is left or the body is a
/// placeholder.
pub fn clean_body(body: &str) -> Option<String> {
    if is_placeholder(body) {
        return None;
    }

    let body = body.replace("```", "").replace("[BODY]", "");
    let mut body = body.trim();
    for label in ["Body:", "body:", "BODY:"] {
        if let Some(rest) = body.strip_prefix(label) {
            body = rest.trim();
        }
    }

    (!body.is_empty()).then(|| body.to_string())
}

/// Flatten a bulleted body to plain lines.
///
/// Rendering re-adds the bullets, so this keeps normalization of an
/// already rendered message stable.
pub fn unbullet(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .unwrap_or(line)
                .trim()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
