//! Commit message prompting, parsing, validation and repair.

pub mod body;
pub mod length;
pub mod message;
pub mod normalize;
pub mod parse;
pub mod prompt;
pub mod repair;
pub mod validate;

pub use body::default_body;
pub use length::{LengthAdjustment, enforce_lengths, smart_truncate};
pub use message::CommitMessage;
pub use normalize::{NormalizeState, Normalized, normalize};
pub use parse::{HeaderSyntax, ParseOptions, ParseStrategy, parse_message};
pub use prompt::{build_commit_prompt, build_system_prompt};
pub use repair::{RepairAction, repair};
pub use validate::validate;
