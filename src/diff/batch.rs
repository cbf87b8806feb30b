//! Summaries of very large changesets, grouped into token-bounded batches.

use std::fmt::Write;

use tracing::debug;

use crate::tokenizer::TokenCounter;

use super::priority::ScoredFileUnit;

/// Floor for the per-batch ceiling.
pub const MIN_BATCH_TOKENS: usize = 256;

/// Per-batch ceiling for a context budget.
pub fn batch_ceiling(budget: usize, divisor: usize) -> usize {
    (budget / divisor.max(1)).max(MIN_BATCH_TOKENS)
}

/// Result of batching a changeset.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub text: String,
    /// Number of files in each batch, in order.
    pub batch_sizes: Vec<usize>,
}

impl BatchSummary {
    pub fn batch_count(&self) -> usize {
        self.batch_sizes.len()
    }

    pub fn file_count(&self) -> usize {
        self.batch_sizes.iter().sum()
    }
}

/// Groups per-file summaries into batches no larger than a token ceiling.
pub struct BatchSummarizer<'a, C: TokenCounter + ?Sized> {
    counter: &'a C,
}

impl<'a, C: TokenCounter + ?Sized> BatchSummarizer<'a, C> {
    pub fn new(counter: &'a C) -> Self {
        Self { counter }
    }

    /// Pack summaries of `files` (in priority order) into batches.
    ///
    /// A file starts a new batch when adding it would push the current one
    /// past `batch_tokens`, unless the current batch is still empty. With no
    /// files, `raw_diff` is returned unchanged.
    pub fn summarize(
        &self,
        raw_diff: &str,
        files: &[ScoredFileUnit],
        batch_tokens: usize,
    ) -> BatchSummary {
        if files.is_empty() {
            return BatchSummary {
                text: raw_diff.to_string(),
                batch_sizes: Vec::new(),
            };
        }

        let mut batches: Vec<Vec<&ScoredFileUnit>> = Vec::new();
        let mut current: Vec<&ScoredFileUnit> = Vec::new();
        let mut current_tokens = 0usize;

        for file in files {
            let cost = self.counter.count(file.unit.summary());
            if current_tokens + cost > batch_tokens && !current.is_empty() {
                batches.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
            current.push(file);
            current_tokens += cost;
        }
        if !current.is_empty() {
            batches.push(current);
        }

        debug!(
            "Packed {} files into {} batches of at most {} tokens",
            files.len(),
            batches.len(),
            batch_tokens
        );

        let mut text = String::new();
        let _ = write!(
            text,
            "=== Large Changeset Summary ({} files in {} batches) ===\n\n",
            files.len(),
            batches.len()
        );
        for (idx, batch) in batches.iter().enumerate() {
            let _ = writeln!(
                text,
                "--- Batch {}/{} ({} files) ---",
                idx + 1,
                batches.len(),
                batch.len()
            );
            for file in batch {
                text.push_str(file.unit.summary());
                text.push('\n');
            }
        }

        BatchSummary {
            text,
            batch_sizes: batches.iter().map(Vec::len).collect(),
        }
    }
}
