//! commitron - Fits large diffs into an LLM token budget and turns the
//! model's reply into a clean commit message.
//!
//! # Overview
//!
//! The context side splits a unified diff into per-file units, ranks them,
//! and renders each in full, as a summary, or as a one-line stat until the
//! token budget runs out. The prompt builders wrap that context for the
//! generation call. The commit side parses whatever the model
//! returned (JSON, labeled text, or a bare header), enforces length limits,
//! validates it against the configured convention, and repairs it once.

pub mod commit;
pub mod config;
pub mod diff;
pub mod error;
pub mod git;
pub mod llm;
pub mod tokenizer;

// Re-export commonly used types
pub use commit::{
    CommitMessage, NormalizeState, Normalized, ParseStrategy, build_commit_prompt,
    build_system_prompt, normalize,
};
pub use config::{CommitConfig, Config, ContextConfig, Convention, DiffStrategy, ScoringConfig};
pub use diff::{ContextOutput, ContextStrategy, build_context, resolve_budget};
pub use error::{GitError, NormalizeError, ValidationError};
pub use git::{StagedChanges, collect_staged_changes, open_repository};
pub use llm::{Provider, provider_token_limit};
pub use tokenizer::{TokenCounter, Tokenizer, truncate_to_token_limit};
