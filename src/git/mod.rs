//! Git operations using git2-rs.

pub mod staged;

pub use staged::{StagedChanges, collect_staged_changes, open_repository};
