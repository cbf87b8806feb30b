//! Parsing generator output into a [`CommitMessage`].
//!
//! Parsing is an ordered list of strategies; the first one that yields a
//! usable message wins.

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;

use crate::config::Convention;
use crate::llm::json::brace_candidates;

use super::body::clean_body;
use super::message::CommitMessage;

/// `type(scope)!: subject`. The type is a single word, so prose containing
/// a colon later in the sentence is not mistaken for a header.
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][\w-]*)(?:\(([^)]*)\))?(!)?\s*:\s*(.*)$")
        .expect("header pattern is valid")
});

/// How a header line is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSyntax {
    /// `type(scope)!: subject`.
    Typed,
    /// The whole line is the subject.
    Plain,
}

impl HeaderSyntax {
    /// Plain for [`Convention::None`], whose headers carry no type.
    pub fn for_convention(convention: &Convention) -> Self {
        match convention {
            Convention::None => HeaderSyntax::Plain,
            Convention::Conventional | Convention::Custom(_) => HeaderSyntax::Typed,
        }
    }
}

/// Inputs shared by every parse strategy.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions<'a> {
    /// Type used when the output names none.
    pub default_type: &'a str,
    pub syntax: HeaderSyntax,
}

impl<'a> ParseOptions<'a> {
    pub fn typed(default_type: &'a str) -> Self {
        Self {
            default_type,
            syntax: HeaderSyntax::Typed,
        }
    }

    pub fn plain(default_type: &'a str) -> Self {
        Self {
            default_type,
            syntax: HeaderSyntax::Plain,
        }
    }
}

/// One way of reading generator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// First balanced `{...}` object embedded anywhere in the text.
    EmbeddedJson,
    /// The whole trimmed text as a JSON object.
    WholeDocumentJson,
    /// Markers, labels, or a conventional header line.
    HeuristicText,
    /// Nothing parsed: the whole response becomes the subject.
    Fallback,
}

impl ParseStrategy {
    /// Strategies tried in order. [`ParseStrategy::Fallback`] is not part of
    /// the list; it applies when every listed strategy fails.
    pub const ORDER: [ParseStrategy; 3] = [
        ParseStrategy::EmbeddedJson,
        ParseStrategy::WholeDocumentJson,
        ParseStrategy::HeuristicText,
    ];

    /// Apply this strategy alone.
    pub fn parse(&self, raw: &str, opts: ParseOptions<'_>) -> Option<CommitMessage> {
        match self {
            ParseStrategy::EmbeddedJson => brace_candidates(raw)
                .filter_map(|candidate| serde_json::from_str::<CommitMessage>(candidate).ok())
                .find(is_meaningful)
                .map(|msg| split_header(msg, opts.syntax)),
            ParseStrategy::WholeDocumentJson => serde_json::from_str::<CommitMessage>(raw.trim())
                .ok()
                .filter(is_meaningful)
                .map(|msg| split_header(msg, opts.syntax)),
            ParseStrategy::HeuristicText => parse_text(raw, opts),
            ParseStrategy::Fallback => Some(CommitMessage::new(opts.default_type, raw.trim())),
        }
    }
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseStrategy::EmbeddedJson => write!(f, "embedded-json"),
            ParseStrategy::WholeDocumentJson => write!(f, "whole-document-json"),
            ParseStrategy::HeuristicText => write!(f, "heuristic-text"),
            ParseStrategy::Fallback => write!(f, "fallback"),
        }
    }
}

fn is_meaningful(msg: &CommitMessage) -> bool {
    !msg.commit_type.is_empty() || !msg.subject.is_empty()
}

/// Run the strategies in order and return the first success.
pub fn parse_message(raw: &str, opts: ParseOptions<'_>) -> (CommitMessage, ParseStrategy) {
    for strategy in ParseStrategy::ORDER {
        if let Some(message) = strategy.parse(raw, opts) {
            debug!("Parsed commit message with {} strategy", strategy);
            return (message, strategy);
        }
    }

    debug!("No parse strategy matched, using whole response as subject");
    let message = ParseStrategy::Fallback
        .parse(raw, opts)
        .unwrap_or_else(|| CommitMessage::new(opts.default_type, ""));
    (message, ParseStrategy::Fallback)
}

/// Header fields parsed from one line: `(type, scope, breaking, subject)`.
struct Header<'a> {
    commit_type: Option<&'a str>,
    scope: Option<&'a str>,
    breaking: bool,
    subject: &'a str,
}

/// Parse a header line. A leading bare `:` means "no type".
fn parse_header(line: &str, syntax: HeaderSyntax) -> Header<'_> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(':') {
        return Header {
            commit_type: None,
            scope: None,
            breaking: false,
            subject: rest.trim(),
        };
    }

    if syntax == HeaderSyntax::Plain {
        return Header {
            commit_type: None,
            scope: None,
            breaking: false,
            subject: line,
        };
    }

    if let Some(caps) = HEADER_RE.captures(line) {
        let scope = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty());
        return Header {
            commit_type: caps.get(1).map(|m| m.as_str()),
            scope,
            breaking: caps.get(3).is_some(),
            subject: caps.get(4).map(|m| m.as_str().trim()).unwrap_or(""),
        };
    }

    Header {
        commit_type: None,
        scope: None,
        breaking: false,
        subject: line,
    }
}

/// Split a `type(scope): subject` header smuggled into a JSON subject.
fn split_header(mut msg: CommitMessage, syntax: HeaderSyntax) -> CommitMessage {
    let header = parse_header(&msg.subject, syntax);
    let Some(commit_type) = header.commit_type else {
        return msg;
    };

    if msg.commit_type.is_empty() || msg.commit_type.eq_ignore_ascii_case(commit_type) {
        msg.commit_type = commit_type.to_string();
        if msg.scope.is_none() {
            msg.scope = header.scope.map(str::to_string);
        }
        msg.breaking |= header.breaking;
        msg.subject = header.subject.to_string();
    }
    msg
}

fn message_from_header(line: &str, opts: ParseOptions<'_>) -> CommitMessage {
    let header = parse_header(line, opts.syntax);
    CommitMessage {
        commit_type: header.commit_type.unwrap_or(opts.default_type).to_string(),
        scope: header.scope.map(str::to_string),
        subject: header.subject.to_string(),
        body: None,
        breaking: header.breaking,
    }
}

/// Case-insensitive `label:` prefix match, returning the rest of the line.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let trimmed = line.trim_start();
    let head = trimmed.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(trimmed[label.len()..].trim())
    } else {
        None
    }
}

/// Join body lines, dropping leading and trailing blank lines.
fn join_body(lines: &[&str]) -> Option<String> {
    let text = lines.join("\n");
    clean_body(&text)
}

fn parse_text(raw: &str, opts: ParseOptions<'_>) -> Option<CommitMessage> {
    let lines: Vec<&str> = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect();

    let message = parse_marked(&lines, opts)
        .or_else(|| parse_labeled(&lines, opts))
        .or_else(|| parse_plain(&lines, opts))?;

    (!message.subject.is_empty()).then_some(message)
}

/// `[SUBJECT]` / `[BODY]` markers, each on its own line or inline.
fn parse_marked(lines: &[&str], opts: ParseOptions<'_>) -> Option<CommitMessage> {
    let subject_idx = lines.iter().position(|l| l.contains("[SUBJECT]"))?;

    let inline = lines[subject_idx].replace("[SUBJECT]", "");
    let header = if inline.trim().is_empty() {
        lines[subject_idx + 1..]
            .iter()
            .find(|l| !l.trim().is_empty() && !l.contains("[BODY]"))
            .map(|l| l.to_string())
            .unwrap_or_default()
    } else {
        inline
    };

    let mut message = message_from_header(&header, opts);
    if let Some(body_idx) = lines.iter().position(|l| l.contains("[BODY]")) {
        let first = lines[body_idx].replace("[BODY]", "");
        let mut body_lines = vec![first.as_str()];
        body_lines.extend_from_slice(&lines[body_idx + 1..]);
        message.body = join_body(&body_lines);
    }
    Some(message)
}

/// `Subject:` / `Body:` labels.
fn parse_labeled(lines: &[&str], opts: ParseOptions<'_>) -> Option<CommitMessage> {
    let (subject_idx, subject) = lines
        .iter()
        .enumerate()
        .find_map(|(idx, line)| strip_label(line, "subject:").map(|rest| (idx, rest)))?;

    let mut message = message_from_header(subject, opts);
    if let Some((body_idx, first)) = lines
        .iter()
        .enumerate()
        .skip(subject_idx + 1)
        .find_map(|(idx, line)| strip_label(line, "body:").map(|rest| (idx, rest)))
    {
        let mut body_lines = vec![first];
        body_lines.extend_from_slice(&lines[body_idx + 1..]);
        message.body = join_body(&body_lines);
    }
    Some(message)
}

/// First non-empty line is the header; the body follows the first blank
/// line, or directly follows the header when there is no blank line.
fn parse_plain(lines: &[&str], opts: ParseOptions<'_>) -> Option<CommitMessage> {
    let header_idx = lines.iter().position(|l| !l.trim().is_empty())?;
    let mut message = message_from_header(lines[header_idx], opts);

    let rest = &lines[header_idx + 1..];
    let body_lines = match rest.iter().position(|l| l.trim().is_empty()) {
        Some(blank) => &rest[blank + 1..],
        None => rest,
    };
    message.body = join_body(body_lines);
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> (CommitMessage, ParseStrategy) {
        parse_message(raw, ParseOptions::typed("chore"))
    }

    #[test]
    fn test_embedded_json_wins() {
        let raw = "Here you go:\n```json\n{\"type\": \"feat\", \"scope\": \"api\", \"subject\": \"add pagination\", \"body\": \"Use cursors\"}\n```";
        let (msg, strategy) = parse(raw);
        assert_eq!(strategy, ParseStrategy::EmbeddedJson);
        assert_eq!(msg.commit_type, "feat");
        assert_eq!(msg.scope.as_deref(), Some("api"));
        assert_eq!(msg.subject, "add pagination");
        assert_eq!(msg.body.as_deref(), Some("Use cursors"));
    }

    #[test]
    fn test_embedded_json_skips_non_message_objects() {
        let raw = r#"config {"a": 1} then {"type": "fix", "subject": "handle nulls"}"#;
        let (msg, strategy) = parse(raw);
        assert_eq!(strategy, ParseStrategy::EmbeddedJson);
        assert_eq!(msg.subject, "handle nulls");
    }

    #[test]
    fn test_json_subject_with_header_is_split() {
        let (msg, _) = parse(r#"{"subject": "fix(parser)!: handle renames"}"#);
        assert_eq!(msg.commit_type, "fix");
        assert_eq!(msg.scope.as_deref(), Some("parser"));
        assert!(msg.breaking);
        assert_eq!(msg.subject, "handle renames");

        let (msg, _) = parse(r#"{"type": "feat", "subject": "feat: add login"}"#);
        assert_eq!(msg.subject, "add login");
    }

    #[test]
    fn test_whole_document_strategy_in_isolation() {
        let raw = r#"  {"type": "docs", "subject": "describe flags"}  "#;
        let opts = ParseOptions::typed("chore");
        let msg = ParseStrategy::WholeDocumentJson.parse(raw, opts).unwrap();
        assert_eq!(msg.commit_type, "docs");
        assert!(ParseStrategy::WholeDocumentJson.parse("docs: x", opts).is_none());
    }

    #[test]
    fn test_conventional_text_header_and_body() {
        let raw = "feat(auth): add login endpoint\n\nSupport password and token flows.\nAdd rate limiting.";
        let (msg, strategy) = parse(raw);
        assert_eq!(strategy, ParseStrategy::HeuristicText);
        assert_eq!(msg.commit_type, "feat");
        assert_eq!(msg.scope.as_deref(), Some("auth"));
        assert_eq!(msg.subject, "add login endpoint");
        assert_eq!(
            msg.body.as_deref(),
            Some("Support password and token flows.\nAdd rate limiting.")
        );
    }

    #[test]
    fn test_leading_bare_colon_defaults_type() {
        let (msg, _) = parse(": add feature");
        assert_eq!(msg.commit_type, "chore");
        assert_eq!(msg.subject, "add feature");
    }

    #[test]
    fn test_no_colon_uses_whole_line_with_default_type() {
        let (msg, _) = parse("Improve error messages for bad config");
        assert_eq!(msg.commit_type, "chore");
        assert_eq!(msg.subject, "Improve error messages for bad config");
        assert!(msg.body.is_none());
    }

    #[test]
    fn test_prose_colon_is_not_a_header() {
        let (msg, _) = parse("Handle the edge case: empty input");
        assert_eq!(msg.commit_type, "chore");
        assert_eq!(msg.subject, "Handle the edge case: empty input");
    }

    #[test]
    fn test_body_without_blank_line() {
        let (msg, _) = parse("fix: close file handles\nRelease handles on error paths");
        assert_eq!(msg.body.as_deref(), Some("Release handles on error paths"));
    }

    #[test]
    fn test_subject_and_body_markers() {
        let raw = "[SUBJECT]\nrefactor(core): split allocator\n[BODY]\nMove batching into its own module";
        let (msg, _) = parse(raw);
        assert_eq!(msg.commit_type, "refactor");
        assert_eq!(msg.scope.as_deref(), Some("core"));
        assert_eq!(msg.subject, "split allocator");
        assert_eq!(msg.body.as_deref(), Some("Move batching into its own module"));
    }

    #[test]
    fn test_subject_and_body_labels() {
        let raw = "Subject: perf: cache summaries\nBody: Summaries are computed once per file.";
        let (msg, _) = parse(raw);
        assert_eq!(msg.commit_type, "perf");
        assert_eq!(msg.subject, "cache summaries");
        assert_eq!(msg.body.as_deref(), Some("Summaries are computed once per file."));
    }

    #[test]
    fn test_code_fences_are_ignored() {
        let (msg, _) = parse("```\nci: cache cargo registry\n```");
        assert_eq!(msg.commit_type, "ci");
        assert_eq!(msg.subject, "cache cargo registry");
        assert!(msg.body.is_none());
    }

    #[test]
    fn test_placeholder_body_is_dropped() {
        let (msg, _) = parse("feat: add x\n\n<optional body>");
        assert!(msg.body.is_none());
    }

    #[test]
    fn test_blank_response_falls_back() {
        let (msg, strategy) = parse("   \n```\n```\n");
        assert_eq!(strategy, ParseStrategy::Fallback);
        assert_eq!(msg.commit_type, "chore");
    }

    #[test]
    fn test_plain_syntax_keeps_colons_in_subject() {
        let opts = ParseOptions::plain("chore");
        let (msg, strategy) = parse_message("fix: Resolve: edge case\n\nGuard empty input", opts);
        assert_eq!(strategy, ParseStrategy::HeuristicText);
        assert_eq!(msg.commit_type, "chore");
        assert_eq!(msg.scope, None);
        assert_eq!(msg.subject, "fix: Resolve: edge case");
        assert_eq!(msg.body.as_deref(), Some("Guard empty input"));
    }

    #[test]
    fn test_plain_syntax_leaves_json_subject_whole() {
        let opts = ParseOptions::plain("chore");
        let (msg, _) = parse_message(r#"{"subject": "feat(ui): Add search"}"#, opts);
        assert_eq!(msg.subject, "feat(ui): Add search");
        assert!(msg.commit_type.is_empty());
    }

    #[test]
    fn test_header_syntax_for_convention() {
        assert_eq!(HeaderSyntax::for_convention(&Convention::None), HeaderSyntax::Plain);
        assert_eq!(
            HeaderSyntax::for_convention(&Convention::Conventional),
            HeaderSyntax::Typed
        );
        assert_eq!(
            HeaderSyntax::for_convention(&Convention::Custom("{subject}".to_string())),
            HeaderSyntax::Typed
        );
    }
}
