//! Splitting a unified diff into per-file units.

use std::fmt;
use std::sync::OnceLock;

use tracing::debug;

use super::summary::summarize;

/// Line that opens every file section of a git diff.
const SEPARATOR: &str = "diff --git ";

/// Status of a changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "Added"),
            FileStatus::Modified => write!(f, "Modified"),
            FileStatus::Deleted => write!(f, "Deleted"),
            FileStatus::Renamed => write!(f, "Renamed"),
        }
    }
}

/// One file's section of a unified diff.
#[derive(Debug, Clone)]
pub struct FileUnit {
    pub path: String,
    /// Source path for renames and copies.
    pub old_path: Option<String>,
    pub status: FileStatus,
    pub added_lines: usize,
    pub removed_lines: usize,
    /// Exact diff text of this section, separator line included.
    pub raw_content: String,
    summary: OnceLock<String>,
}

impl FileUnit {
    /// A unit for a path that is listed as changed but has no diff text
    /// (binary files, mode-only changes).
    pub fn listed_only(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            old_path: None,
            status: FileStatus::Modified,
            added_lines: 0,
            removed_lines: 0,
            raw_content: String::new(),
            summary: OnceLock::new(),
        }
    }

    /// Compact summary of this unit, computed on first use.
    pub fn summary(&self) -> &str {
        self.summary.get_or_init(|| summarize(self))
    }

    /// One-line `File: path (+A, -R)` fallback.
    pub fn stats_line(&self) -> String {
        format!(
            "File: {} (+{}, -{})\n",
            self.path, self.added_lines, self.removed_lines
        )
    }

    pub fn total_changes(&self) -> usize {
        self.added_lines + self.removed_lines
    }
}

/// Split a unified diff into file units, in order of appearance.
///
/// Text before the first `diff --git` line belongs to no unit. When the
/// separator line is unreadable the path comes from the `+++`, `rename to`
/// or `copy to` headers; sections with no path anywhere are skipped.
pub fn parse_diff(diff: &str) -> Vec<FileUnit> {
    let mut units = Vec::new();
    let mut section: Option<String> = None;

    for line in diff.split_inclusive('\n') {
        if line.starts_with(SEPARATOR) {
            if let Some(text) = section.take() {
                push_section(&mut units, text);
            }
            section = Some(String::new());
        }
        if let Some(text) = section.as_mut() {
            text.push_str(line);
        }
    }

    if let Some(text) = section {
        push_section(&mut units, text);
    }

    units
}

fn push_section(units: &mut Vec<FileUnit>, text: String) {
    match parse_section(text) {
        Some(unit) => units.push(unit),
        None => debug!("Skipping diff section without a recognizable path"),
    }
}

/// Add a stats-only unit for each listed path that has no diff section.
pub fn with_file_list(mut units: Vec<FileUnit>, files: &[String]) -> Vec<FileUnit> {
    for file in files {
        let file = file.trim();
        if file.is_empty() || units.iter().any(|u| u.path == file) {
            continue;
        }
        units.push(FileUnit::listed_only(file));
    }
    units
}

fn parse_section(raw_content: String) -> Option<FileUnit> {
    let mut lines = raw_content.lines();
    let separator = lines.next()?;
    let mut path = parse_separator(separator);

    let mut old_path = None;
    let mut status: Option<FileStatus> = None;
    let mut added_lines = 0usize;
    let mut removed_lines = 0usize;
    let mut in_hunks = false;

    for line in lines {
        if !in_hunks {
            if line.starts_with("@@") {
                in_hunks = true;
                continue;
            }
            if let Some(dest) = line.strip_prefix("+++ ") {
                if let Some(dest) = header_path(dest) {
                    if let Some(dest) = dest.strip_prefix("b/") {
                        path = Some(dest.to_string());
                    }
                }
                continue;
            }
            if line.starts_with("--- ") {
                continue;
            }
            if let Some(dest) = line
                .strip_prefix("rename to ")
                .or_else(|| line.strip_prefix("copy to "))
            {
                if let Some(dest) = header_path(dest) {
                    path = Some(dest);
                }
                continue;
            }
            if let Some(src) = line
                .strip_prefix("rename from ")
                .or_else(|| line.strip_prefix("copy from "))
            {
                old_path = header_path(src);
            }
            if status.is_none() {
                status = header_marker(line);
            }
            continue;
        }

        if line.starts_with('+') {
            added_lines += 1;
        } else if line.starts_with('-') {
            removed_lines += 1;
        }
    }

    let path = path?;
    Some(FileUnit {
        path,
        old_path,
        status: status.unwrap_or(FileStatus::Modified),
        added_lines,
        removed_lines,
        raw_content,
        summary: OnceLock::new(),
    })
}

/// Status implied by an extended header line, if any.
fn header_marker(line: &str) -> Option<FileStatus> {
    if line.starts_with("new file mode") || line.starts_with("copy from ") {
        Some(FileStatus::Added)
    } else if line.starts_with("deleted file mode") {
        Some(FileStatus::Deleted)
    } else if line.starts_with("rename from ") {
        Some(FileStatus::Renamed)
    } else {
        None
    }
}

/// Destination path from `diff --git a/<old> b/<new>`.
///
/// Paths may contain spaces, so when both sides are the same path the split
/// point is the middle of the line; otherwise the last ` b/` is used. Git
/// quotes paths with unusual bytes as `"a/..." "b/..."`.
fn parse_separator(line: &str) -> Option<String> {
    let rest = line.strip_prefix(SEPARATOR)?.trim_end();

    if rest.ends_with('"') {
        let idx = rest.rfind(" \"b/")?;
        let (dest, _) = unquote(&rest[idx + 1..])?;
        return non_empty(dest.strip_prefix("b/")?);
    }

    let rest = rest.strip_prefix("a/")?;

    let half = rest.len().saturating_sub(3) / 2;
    if rest.is_char_boundary(half)
        && rest[half..].starts_with(" b/")
        && rest[..half] == rest[half + 3..]
    {
        return Some(rest[half + 3..].to_string());
    }

    let idx = rest.rfind(" b/")?;
    non_empty(&rest[idx + 3..])
}

fn non_empty(path: &str) -> Option<String> {
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Path from an extended header value, unquoting it when git quoted it.
fn header_path(value: &str) -> Option<String> {
    let value = value.trim_end();
    if value.starts_with('"') {
        unquote(value).map(|(path, _)| path)
    } else {
        non_empty(value)
    }
}

/// Decode a C-style quoted string at the start of `s`.
///
/// Returns the decoded text and whatever follows the closing quote. Octal
/// escapes are raw bytes, so multi-byte UTF-8 names come back intact.
fn unquote(s: &str) -> Option<(String, &str)> {
    let body = s.strip_prefix('"')?;
    let bytes = body.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let decoded = String::from_utf8_lossy(&out).into_owned();
                return Some((decoded, &body[i + 1..]));
            }
            b'\\' => {
                let escaped = *bytes.get(i + 1)?;
                i += 2;
                match escaped {
                    b'0'..=b'7' => {
                        let mut value = u32::from(escaped - b'0');
                        let mut digits = 1;
                        while digits < 3 {
                            match bytes.get(i).copied() {
                                Some(d @ b'0'..=b'7') => {
                                    value = value * 8 + u32::from(d - b'0');
                                    i += 1;
                                    digits += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push(u8::try_from(value).ok()?);
                    }
                    b'n' => out.push(b'\n'),
                    b't' => out.push(b'\t'),
                    b'r' => out.push(b'\r'),
                    b'a' => out.push(0x07),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'v' => out.push(0x0b),
                    other => out.push(other),
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    None
}
