//! Diff parsing, prioritization and token-budgeted context building.

pub mod batch;
pub mod budget;
pub mod context;
pub mod parser;
pub mod priority;
pub mod summary;

pub use batch::{BatchSummarizer, BatchSummary, MIN_BATCH_TOKENS};
pub use budget::{Allocation, BudgetAllocator, FileAllocation, Inclusion};
pub use context::{ContextOutput, ContextStrategy, build_context, resolve_budget};
pub use parser::{FileStatus, FileUnit, parse_diff, with_file_list};
pub use priority::{ScoredFileUnit, prioritize, score};
