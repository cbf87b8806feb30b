//! Header and body length enforcement.
//!
//! Lengths are measured in characters. The header is shortened in stages:
//! smart truncation of the subject, then a shorter scope, then no scope,
//! then the placeholder subject.

use tracing::debug;

use crate::config::{CommitConfig, Convention};

use super::message::CommitMessage;

/// Suffix marking truncated text.
pub const ELLIPSIS: &str = "...";

/// How far back from the cut a word boundary is searched for.
const BREAK_WINDOW: usize = 10;

/// Below this much subject room the scope gives way.
const MIN_SUBJECT_ROOM: usize = 10;

/// Length a scope is cut to before it is dropped.
const SHORT_SCOPE_LEN: usize = 5;

/// A change made to fit the configured limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthAdjustment {
    SubjectTruncated,
    ScopeShortened,
    ScopeDropped,
    PlaceholderSubject,
    BodyTruncated,
}

/// Cut `text` to at most `max_chars` characters ending in [`ELLIPSIS`],
/// preferring a space, comma or semicolon within the last
/// [`BREAK_WINDOW`] characters before the cut.
pub fn smart_truncate(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    let cut = max_chars.saturating_sub(ELLIPSIS.len());
    let floor = cut.saturating_sub(BREAK_WINDOW);
    let break_at = (floor + 1..=cut)
        .rev()
        .find(|&i| i < chars.len() && matches!(chars[i], ' ' | ',' | ';'))
        .unwrap_or(cut);

    let mut truncated: String = chars[..break_at].iter().collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Characters of the header not taken by the subject.
fn overhead(msg: &CommitMessage, config: &CommitConfig) -> usize {
    msg.header_len(&config.convention)
        .saturating_sub(msg.subject.chars().count())
}

fn subject_room(msg: &CommitMessage, config: &CommitConfig) -> usize {
    config.max_length.saturating_sub(overhead(msg, config))
}

fn header_fits(msg: &CommitMessage, config: &CommitConfig) -> bool {
    msg.header_len(&config.convention) <= config.max_length
}

/// Shorten a scope to [`SHORT_SCOPE_LEN`] characters without a dangling
/// separator.
fn shorten_scope(scope: &str) -> Option<String> {
    let short: String = scope.chars().take(SHORT_SCOPE_LEN).collect();
    let short = short.trim_end_matches(['-', '_', '/']);
    (!short.is_empty()).then(|| short.to_string())
}

/// Bring the header within `max_length`.
pub fn fit_header(msg: &mut CommitMessage, config: &CommitConfig) -> Vec<LengthAdjustment> {
    let mut adjustments = Vec::new();
    if header_fits(msg, config) {
        return adjustments;
    }

    if subject_room(msg, config) >= MIN_SUBJECT_ROOM {
        let room = subject_room(msg, config);
        msg.subject = smart_truncate(&msg.subject, room);
        adjustments.push(LengthAdjustment::SubjectTruncated);
        if header_fits(msg, config) {
            return adjustments;
        }
    }

    if config.convention != Convention::None {
        let long_scope = msg
            .scope
            .as_deref()
            .filter(|scope| scope.chars().count() > SHORT_SCOPE_LEN);
        if let Some(scope) = long_scope {
            if subject_room(msg, config) < MIN_SUBJECT_ROOM {
                msg.scope = shorten_scope(scope);
                adjustments.push(LengthAdjustment::ScopeShortened);
            }
        }
        if subject_room(msg, config) < MIN_SUBJECT_ROOM && msg.scope.is_some() {
            msg.scope = None;
            adjustments.push(LengthAdjustment::ScopeDropped);
        }
    }

    let room = subject_room(msg, config);
    if room < MIN_SUBJECT_ROOM {
        msg.subject = config.placeholder_subject.clone();
        adjustments.push(LengthAdjustment::PlaceholderSubject);
    } else if msg.subject.chars().count() > room {
        msg.subject = smart_truncate(&msg.subject, room);
        adjustments.push(LengthAdjustment::SubjectTruncated);
    }

    adjustments
}

/// Hard-cut the body to `max_body_length` characters, ellipsis included.
pub fn fit_body(msg: &mut CommitMessage, config: &CommitConfig) -> Option<LengthAdjustment> {
    let body = msg.body.as_ref()?;
    if body.chars().count() <= config.max_body_length {
        return None;
    }

    let keep = config.max_body_length.saturating_sub(ELLIPSIS.len());
    let mut cut: String = body.chars().take(keep).collect();
    cut.push_str(ELLIPSIS);
    msg.body = Some(cut);
    Some(LengthAdjustment::BodyTruncated)
}

/// Apply header and (when bodies are rendered) body limits.
pub fn enforce_lengths(msg: &mut CommitMessage, config: &CommitConfig) -> Vec<LengthAdjustment> {
    let mut adjustments = fit_header(msg, config);
    if config.include_body {
        adjustments.extend(fit_body(msg, config));
    }

    if config.verbose && !adjustments.is_empty() {
        debug!(
            "Length enforcement applied {:?}, header is now {} chars",
            adjustments,
            msg.header_len(&config.convention)
        );
    }
    adjustments
}
