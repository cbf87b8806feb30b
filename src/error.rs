//! Error types for commitron modules using thiserror.

use thiserror::Error;

use crate::commit::CommitMessage;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to resolve HEAD: {0}")]
    HeadUnavailable(#[source] git2::Error),

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("No staged changes (stage files with `git add` first)")]
    NoStagedChanges,
}

/// A convention rule a commit message violates.
///
/// Only the first failing rule is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("commit type is required for conventional commits")]
    MissingType,

    #[error("commit type must be lowercase: {0}")]
    TypeNotLowercase(String),

    #[error("commit type '{commit_type}' is not allowed; must be one of: {allowed}")]
    TypeNotAllowed { commit_type: String, allowed: String },

    #[error("commit subject is required")]
    EmptySubject,

    #[error("commit subject should not end with a period")]
    SubjectTrailingPeriod,

    #[error("commit subject should not start with a capital letter")]
    SubjectCapitalized,

    #[error("commit subject should not contain newlines")]
    SubjectMultiline,

    #[error("commit subject '{0}' is too generic, be more specific about what changed")]
    GenericSubject(String),

    #[error("commit body is required when include_body is true")]
    MissingBody,

    #[error("commit body contains placeholder text")]
    PlaceholderBody,

    #[error("commit body is too short (must be at least {min} characters)")]
    BodyTooShort { min: usize },

    #[error("commit body should not open with meta-commentary like '{0}'")]
    MetaCommentaryBody(String),

    #[error("commit body should not be a list of files, focus on what changed and why")]
    FileListBody,

    #[error("commit scope must be lowercase: {0}")]
    ScopeNotLowercase(String),

    #[error("commit scope should not contain whitespace")]
    ScopeWhitespace,

    #[error("commit scope should not contain punctuation: {0}")]
    ScopePunctuation(String),

    #[error("commit scope '{0}' is too generic")]
    GenericScope(String),
}

/// Errors from commit message normalization.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Generator returned an empty response")]
    EmptyResponse,

    /// Repair ran once and the message is still invalid. Callers may fall
    /// back to `raw` or to the best-effort `rendered` text.
    #[error("Commit message still invalid after repair: {violation}")]
    Unresolved {
        violation: ValidationError,
        message: Box<CommitMessage>,
        rendered: String,
        raw: String,
    },
}

impl NormalizeError {
    /// Raw generator text to use as a last resort, when there is any.
    pub fn raw_fallback(&self) -> Option<&str> {
        match self {
            NormalizeError::EmptyResponse => None,
            NormalizeError::Unresolved { raw, .. } => Some(raw.trim()),
        }
    }
}
