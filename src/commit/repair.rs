//! One deterministic repair pass over an invalid commit message.

use tracing::debug;

use crate::config::CommitConfig;

use super::message::CommitMessage;
use super::validate::{FILE_LIST_RE, has_trailing_period, meta_opener};

/// A fix applied by [`repair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairAction {
    DefaultType,
    LowercaseType,
    TypeSynonym,
    SingleLineSubject,
    TrailingPeriod,
    LowercaseSubject,
    GenericSubject,
    MetaCommentary,
    FileList,
    ScopeCleanup,
    GenericScope,
}

/// Apply every applicable fix once and report what changed.
pub fn repair(msg: &mut CommitMessage, config: &CommitConfig) -> Vec<RepairAction> {
    let mut actions = Vec::new();

    repair_type(msg, config, &mut actions);
    repair_subject(msg, config, &mut actions);
    repair_body(msg, &mut actions);
    repair_scope(msg, config, &mut actions);

    if config.verbose {
        debug!("Repair applied {:?}", actions);
    }
    actions
}

fn repair_type(msg: &mut CommitMessage, config: &CommitConfig, actions: &mut Vec<RepairAction>) {
    if msg.commit_type.trim().is_empty() {
        msg.commit_type = config.default_type.clone();
        actions.push(RepairAction::DefaultType);
        return;
    }

    let lower = msg.commit_type.trim().to_lowercase();
    if lower != msg.commit_type {
        msg.commit_type = lower;
        actions.push(RepairAction::LowercaseType);
    }

    if let Some(canonical) = config.type_synonyms.get(&msg.commit_type) {
        msg.commit_type = canonical.clone();
        actions.push(RepairAction::TypeSynonym);
    }
}

fn repair_subject(msg: &mut CommitMessage, config: &CommitConfig, actions: &mut Vec<RepairAction>) {
    if msg.subject.contains('\n') {
        msg.subject = msg
            .subject
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
            .to_string();
        actions.push(RepairAction::SingleLineSubject);
    }

    if has_trailing_period(&msg.subject) {
        msg.subject = msg.subject.trim_end_matches('.').trim_end().to_string();
        actions.push(RepairAction::TrailingPeriod);
    }

    let mut chars = msg.subject.chars();
    if let Some(first) = chars.next().filter(|c| c.is_uppercase()) {
        msg.subject = first.to_lowercase().chain(chars).collect();
        actions.push(RepairAction::LowercaseSubject);
    }

    if let Some(replacement) = config.generic_replacement(msg.subject.trim()) {
        // A replacement that is itself deny-listed would never validate.
        msg.subject = if config.generic_replacement(replacement).is_some() {
            config.placeholder_subject.clone()
        } else {
            replacement.to_string()
        };
        actions.push(RepairAction::GenericSubject);
    }
}

fn repair_body(msg: &mut CommitMessage, actions: &mut Vec<RepairAction>) {
    let Some(body) = msg.body.take() else {
        return;
    };

    let mut lines: Vec<String> = body.lines().map(str::to_string).collect();

    if let Some(first) = lines.first_mut() {
        if let Some(phrase) = meta_opener(first) {
            let trimmed = first.trim_start();
            let rest = trimmed
                .get(phrase.len()..)
                .unwrap_or("")
                .trim_start_matches([' ', ':', ',']);
            *first = capitalize(rest);
            actions.push(RepairAction::MetaCommentary);
        }
    }

    let before = lines.len();
    lines.retain(|line| !FILE_LIST_RE.is_match(line));
    if lines.len() != before {
        actions.push(RepairAction::FileList);
    }

    let body = lines.join("\n").trim().to_string();
    msg.body = (!body.is_empty()).then_some(body);
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn repair_scope(msg: &mut CommitMessage, config: &CommitConfig, actions: &mut Vec<RepairAction>) {
    let Some(scope) = msg.scope.take() else {
        return;
    };

    let mut cleaned = String::with_capacity(scope.len());
    for c in scope.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            cleaned.push(c);
        } else if !cleaned.ends_with('-') {
            // Whitespace and punctuation collapse into a single separator.
            cleaned.push('-');
        }
    }
    let mut cleaned = cleaned.trim_matches('-').to_string();
    if cleaned != scope {
        actions.push(RepairAction::ScopeCleanup);
    }

    if let Some(replacement) = config.generic_replacement(&cleaned) {
        cleaned = replacement.to_string();
        actions.push(RepairAction::GenericScope);
    }

    msg.scope = (!cleaned.is_empty()).then_some(cleaned);
}
