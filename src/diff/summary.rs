//! Compact per-file summaries used when a full diff does not fit.
//!
//! Identifier extraction is driven by an ordered rule table instead of
//! ad-hoc conditionals: each changed line is tested against the rules in
//! order and the first rule that matches names the identifier.

use std::collections::HashSet;
use std::fmt::Write;
use std::sync::LazyLock;

use regex_lite::Regex;

use super::parser::{FileStatus, FileUnit};

/// Maximum identifiers kept per category (added / removed).
pub const MAX_IDENTIFIERS: usize = 5;

/// Maximum changed lines quoted in a summary.
pub const MAX_KEY_CHANGES: usize = 5;

/// What kind of declaration an identifier rule recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Function,
    Method,
    Type,
    Generic,
}

/// One entry of the identifier rule table.
pub struct IdentifierRule {
    pub kind: DeclarationKind,
    pub pattern: Regex,
}

/// Rules in evaluation order. Capture group 1 is the identifier.
static IDENTIFIER_RULES: LazyLock<Vec<IdentifierRule>> = LazyLock::new(|| {
    [
        // Rust
        (DeclarationKind::Function, r"\bfn\s+([A-Za-z_]\w*)"),
        // Go, with optional receiver
        (DeclarationKind::Function, r"\bfunc\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)"),
        // JavaScript / TypeScript
        (DeclarationKind::Function, r"\bfunction\s*\*?\s*([A-Za-z_$][\w$]*)"),
        // Python
        (DeclarationKind::Function, r"\bdef\s+([A-Za-z_]\w*)"),
        (
            DeclarationKind::Type,
            r"\b(?:class|struct|enum|trait|interface|impl)\s+([A-Za-z_]\w*)",
        ),
        // Java / C# / C++ access-modified methods
        (
            DeclarationKind::Method,
            r"\b(?:public|private|protected)\s+(?:static\s+)?[\w<>\[\],.]+\s+([A-Za-z_]\w*)\s*\(",
        ),
        (DeclarationKind::Generic, r"([A-Za-z_]\w*)\s*\([^)]*\)\s*\{"),
    ]
    .into_iter()
    .map(|(kind, pattern)| IdentifierRule {
        kind,
        pattern: Regex::new(pattern).expect("identifier pattern is valid"),
    })
    .collect()
});

/// Words the generic rule picks up that are control flow, not names.
const KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "match", "return", "else", "loop", "with",
    "synchronized", "foreach", "elif", "sizeof",
];

/// Prefixes of import-only lines, which carry no intent.
const IMPORT_PREFIXES: &[&str] = &["import ", "use ", "#include", "require(", "from "];

/// Lines that are pure punctuation noise.
const NOISE_LINES: &[&str] = &["{", "}", "};", "},", "(", ")", ");", "[", "]", "],"];

/// Name declared on `line` according to the first matching rule.
pub fn declared_identifier(line: &str) -> Option<(DeclarationKind, &str)> {
    for rule in IDENTIFIER_RULES.iter() {
        let Some(caps) = rule.pattern.captures(line) else {
            continue;
        };
        let Some(name) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if rule.kind == DeclarationKind::Generic && KEYWORDS.contains(&name) {
            continue;
        }
        return Some((rule.kind, name));
    }
    None
}

/// Changed lines of a unit's hunks, as `(is_addition, content_without_sign)`.
fn changed_lines(raw: &str) -> impl Iterator<Item = (bool, &str)> {
    raw.lines()
        .skip_while(|line| !line.starts_with("@@"))
        .filter_map(|line| {
            if let Some(rest) = line.strip_prefix('+') {
                Some((true, rest))
            } else {
                line.strip_prefix('-').map(|rest| (false, rest))
            }
        })
}

/// Unique identifiers declared on added and removed lines.
pub fn extract_identifiers(raw: &str) -> (Vec<String>, Vec<String>) {
    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut seen_added = HashSet::new();
    let mut seen_removed = HashSet::new();

    for (is_addition, content) in changed_lines(raw) {
        let Some((_, name)) = declared_identifier(content) else {
            continue;
        };
        let (names, seen) = if is_addition {
            (&mut added, &mut seen_added)
        } else {
            (&mut removed, &mut seen_removed)
        };
        if names.len() < MAX_IDENTIFIERS && seen.insert(name.to_string()) {
            names.push(format!("{name}()"));
        }
    }

    (added, removed)
}

fn is_noise(trimmed: &str) -> bool {
    trimmed.is_empty()
        || NOISE_LINES.contains(&trimmed)
        || IMPORT_PREFIXES.iter().any(|p| trimmed.starts_with(p))
}

/// The most meaningful changed lines, additions preferred.
///
/// Up to half of the slots (rounded up) go to additions first, then
/// deletions, then any remaining additions fill what is left.
pub fn extract_key_changes(raw: &str, max_lines: usize) -> Vec<String> {
    let mut additions = Vec::new();
    let mut deletions = Vec::new();

    for (is_addition, content) in changed_lines(raw) {
        let trimmed = content.trim();
        if is_noise(trimmed) {
            continue;
        }
        if is_addition {
            additions.push(format!("+{trimmed}"));
        } else {
            deletions.push(format!("-{trimmed}"));
        }
    }

    let first_additions = max_lines.div_ceil(2).min(additions.len());
    let mut changes: Vec<String> = additions.drain(..first_additions).collect();

    let deletion_slots = max_lines - changes.len();
    changes.extend(deletions.into_iter().take(deletion_slots));

    let remaining = max_lines - changes.len();
    changes.extend(additions.into_iter().take(remaining));

    changes
}

/// Build the summary text for one file unit.
pub fn summarize(unit: &FileUnit) -> String {
    let mut summary = String::new();

    let status = match unit.status {
        FileStatus::Added => "new file, ",
        FileStatus::Deleted => "deleted, ",
        FileStatus::Renamed => "renamed, ",
        FileStatus::Modified => "",
    };
    let _ = writeln!(
        summary,
        "File: {} ({}+{}, -{})",
        unit.path, status, unit.added_lines, unit.removed_lines
    );

    let (added, removed) = extract_identifiers(&unit.raw_content);
    if !added.is_empty() {
        let _ = writeln!(summary, "  Added/Modified: {}", added.join(", "));
    }
    if !removed.is_empty() {
        let _ = writeln!(summary, "  Removed: {}", removed.join(", "));
    }

    let key_changes = extract_key_changes(&unit.raw_content, MAX_KEY_CHANGES);
    if !key_changes.is_empty() {
        summary.push_str("  Key changes:\n");
        for change in key_changes {
            let _ = writeln!(summary, "    {change}");
        }
    }

    summary
}
