//! Convention rules for commit messages.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::config::{CommitConfig, Convention};
use crate::error::ValidationError;

use super::body::is_placeholder;
use super::length::ELLIPSIS;
use super::message::CommitMessage;

/// Minimum body length in characters when a body is mandated.
pub const MIN_BODY_LEN: usize = 10;

/// Meta-commentary openers, longest first so stripping removes the whole
/// phrase.
pub const META_OPENERS: &[&str] = &[
    "the changes made to",
    "the changes include",
    "the changes made",
    "the changes",
    "this commit",
    "this code",
    "the code",
    "the files",
    "the file",
];

/// A `file:` / `files:` label marking a file listing.
pub(crate) static FILE_LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfiles?:").expect("file list pattern is valid"));

/// The meta-commentary phrase `text` opens with, if any.
///
/// The phrase must end at a word boundary, so "the filesystem" is not
/// "the file".
pub fn meta_opener(text: &str) -> Option<&'static str> {
    let lower = text.trim_start().to_lowercase();
    META_OPENERS.iter().copied().find(|phrase| {
        lower.starts_with(phrase)
            && lower[phrase.len()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric())
    })
}

/// Whether a subject ends in a terminal period (an ellipsis does not count).
pub fn has_trailing_period(subject: &str) -> bool {
    subject.ends_with('.') && !subject.ends_with(ELLIPSIS)
}

/// First scope character that is not alphanumeric, `-` or whitespace.
fn scope_punctuation(scope: &str) -> Option<char> {
    scope
        .chars()
        .find(|c| !c.is_alphanumeric() && *c != '-' && !c.is_whitespace())
}

/// Check `msg` against the configured convention.
pub fn validate(msg: &CommitMessage, config: &CommitConfig) -> Result<(), ValidationError> {
    if config.convention == Convention::None {
        return validate_subject_shape(&msg.subject);
    }

    validate_type(msg, config)?;
    validate_subject(msg, config)?;
    if config.include_body {
        validate_body(msg)?;
    }
    validate_scope(msg, config)
}

fn validate_subject_shape(subject: &str) -> Result<(), ValidationError> {
    if subject.trim().is_empty() {
        return Err(ValidationError::EmptySubject);
    }
    if subject.contains('\n') {
        return Err(ValidationError::SubjectMultiline);
    }
    Ok(())
}

fn validate_type(msg: &CommitMessage, config: &CommitConfig) -> Result<(), ValidationError> {
    let commit_type = msg.commit_type.as_str();
    if commit_type.is_empty() {
        return Err(ValidationError::MissingType);
    }
    if commit_type != commit_type.to_lowercase() {
        return Err(ValidationError::TypeNotLowercase(commit_type.to_string()));
    }
    if !config.is_allowed_type(commit_type) {
        return Err(ValidationError::TypeNotAllowed {
            commit_type: commit_type.to_string(),
            allowed: config.allowed_types.join(", "),
        });
    }
    Ok(())
}

fn validate_subject(msg: &CommitMessage, config: &CommitConfig) -> Result<(), ValidationError> {
    let subject = msg.subject.as_str();
    if subject.is_empty() {
        return Err(ValidationError::EmptySubject);
    }
    if has_trailing_period(subject) {
        return Err(ValidationError::SubjectTrailingPeriod);
    }
    if subject.chars().next().is_some_and(char::is_uppercase) {
        return Err(ValidationError::SubjectCapitalized);
    }
    if subject.contains('\n') {
        return Err(ValidationError::SubjectMultiline);
    }
    if config.generic_replacement(subject.trim()).is_some() {
        return Err(ValidationError::GenericSubject(subject.to_string()));
    }
    Ok(())
}

fn validate_body(msg: &CommitMessage) -> Result<(), ValidationError> {
    let body = msg.body.as_deref().map(str::trim).unwrap_or("");
    if body.is_empty() {
        return Err(ValidationError::MissingBody);
    }
    if is_placeholder(body) {
        return Err(ValidationError::PlaceholderBody);
    }
    if body.chars().count() < MIN_BODY_LEN {
        return Err(ValidationError::BodyTooShort { min: MIN_BODY_LEN });
    }
    if let Some(phrase) = meta_opener(body) {
        return Err(ValidationError::MetaCommentaryBody(phrase.to_string()));
    }
    if FILE_LIST_RE.is_match(body) {
        return Err(ValidationError::FileListBody);
    }
    Ok(())
}

fn validate_scope(msg: &CommitMessage, config: &CommitConfig) -> Result<(), ValidationError> {
    let Some(scope) = msg.scope.as_deref() else {
        return Ok(());
    };
    if scope != scope.to_lowercase() {
        return Err(ValidationError::ScopeNotLowercase(scope.to_string()));
    }
    if scope.chars().any(char::is_whitespace) {
        return Err(ValidationError::ScopeWhitespace);
    }
    if let Some(c) = scope_punctuation(scope) {
        return Err(ValidationError::ScopePunctuation(c.to_string()));
    }
    if config.generic_replacement(scope).is_some() {
        return Err(ValidationError::GenericScope(scope.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CommitMessage {
        CommitMessage::new("feat", "add pagination to list endpoints")
            .with_scope("api")
            .with_body("Use cursor tokens so clients can resume listing")
    }

    fn check(msg: &CommitMessage) -> Result<(), ValidationError> {
        validate(msg, &CommitConfig::conventional())
    }

    #[test]
    fn test_valid_message() {
        assert_eq!(check(&valid()), Ok(()));
    }

    #[test]
    fn test_type_rules() {
        let mut msg = valid();
        msg.commit_type = String::new();
        assert_eq!(check(&msg), Err(ValidationError::MissingType));

        msg.commit_type = "Feat".to_string();
        assert_eq!(check(&msg), Err(ValidationError::TypeNotLowercase("Feat".to_string())));

        msg.commit_type = "feature".to_string();
        assert!(matches!(check(&msg), Err(ValidationError::TypeNotAllowed { .. })));
    }

    #[test]
    fn test_subject_rules() {
        let mut msg = valid();
        msg.subject = "add pagination.".to_string();
        assert_eq!(check(&msg), Err(ValidationError::SubjectTrailingPeriod));

        msg.subject = "add pagination...".to_string();
        assert_eq!(check(&msg), Ok(()));

        msg.subject = "Add pagination".to_string();
        assert_eq!(check(&msg), Err(ValidationError::SubjectCapitalized));

        msg.subject = "add\npagination".to_string();
        assert_eq!(check(&msg), Err(ValidationError::SubjectMultiline));

        msg.subject = "update".to_string();
        assert_eq!(check(&msg), Err(ValidationError::GenericSubject("update".to_string())));
    }

    #[test]
    fn test_first_failing_rule_is_reported() {
        let mut msg = valid();
        msg.commit_type = "Feat".to_string();
        msg.subject = "Add pagination.".to_string();
        assert_eq!(check(&msg), Err(ValidationError::TypeNotLowercase("Feat".to_string())));
    }

    #[test]
    fn test_body_rules() {
        let mut msg = valid();
        msg.body = None;
        assert_eq!(check(&msg), Err(ValidationError::MissingBody));

        msg.body = Some("<optional body>".to_string());
        assert_eq!(check(&msg), Err(ValidationError::PlaceholderBody));

        msg.body = Some("Tweak".to_string());
        assert_eq!(check(&msg), Err(ValidationError::BodyTooShort { min: MIN_BODY_LEN }));

        msg.body = Some("This commit adds cursor pagination".to_string());
        assert_eq!(
            check(&msg),
            Err(ValidationError::MetaCommentaryBody("this commit".to_string()))
        );

        msg.body = Some("Changed files: api.rs, list.rs".to_string());
        assert_eq!(check(&msg), Err(ValidationError::FileListBody));
    }

    #[test]
    fn test_body_not_required_without_include_body() {
        let mut msg = valid();
        msg.body = None;
        let config = CommitConfig {
            include_body: false,
            ..CommitConfig::conventional()
        };
        assert_eq!(validate(&msg, &config), Ok(()));
    }

    #[test]
    fn test_scope_rules() {
        let mut msg = valid();
        msg.scope = Some("API".to_string());
        assert_eq!(check(&msg), Err(ValidationError::ScopeNotLowercase("API".to_string())));

        msg.scope = Some("list api".to_string());
        assert_eq!(check(&msg), Err(ValidationError::ScopeWhitespace));

        msg.scope = Some("api/v2".to_string());
        assert_eq!(check(&msg), Err(ValidationError::ScopePunctuation("/".to_string())));

        msg.scope = Some("list-api".to_string());
        assert_eq!(check(&msg), Ok(()));

        msg.scope = Some("fix".to_string());
        assert_eq!(check(&msg), Err(ValidationError::GenericScope("fix".to_string())));
    }

    #[test]
    fn test_plain_convention_checks_subject_only() {
        let config = CommitConfig::default();
        let msg = CommitMessage::new("", "Add pagination.");
        assert_eq!(validate(&msg, &config), Ok(()));
        assert_eq!(
            validate(&CommitMessage::new("", " "), &config),
            Err(ValidationError::EmptySubject)
        );
    }

    #[test]
    fn test_meta_opener_respects_word_boundary() {
        assert_eq!(meta_opener("The changes made to the parser"), Some("the changes made to"));
        assert_eq!(meta_opener("The filesystem cache is reused"), None);
    }
}
