//! Public entry point: fit a diff into a token budget.

use tracing::{debug, warn};

use crate::config::{ContextConfig, DiffStrategy};
use crate::llm::provider::provider_token_limit;
use crate::tokenizer::{TokenCounter, truncate_to_token_limit};

use super::batch::{BatchSummarizer, batch_ceiling};
use super::budget::BudgetAllocator;
use super::parser::{parse_diff, with_file_list};
use super::priority::prioritize;

/// What was done to the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStrategy {
    /// Already within budget, returned unchanged.
    Passthrough,
    Truncated,
    Summarized,
    Batched,
}

impl std::fmt::Display for ContextStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextStrategy::Passthrough => write!(f, "passthrough"),
            ContextStrategy::Truncated => write!(f, "truncated"),
            ContextStrategy::Summarized => write!(f, "summarized"),
            ContextStrategy::Batched => write!(f, "batched"),
        }
    }
}

/// A diff reduced to fit a budget.
#[derive(Debug, Clone)]
pub struct ContextOutput {
    pub text: String,
    pub strategy: ContextStrategy,
    pub input_tokens: usize,
    pub output_tokens: usize,
    /// Number of file units the diff was split into.
    pub file_count: usize,
}

/// Context budget for a provider and model under `config`.
pub fn resolve_budget(provider: &str, model: &str, config: &ContextConfig) -> usize {
    config.resolve_budget(provider_token_limit(provider, model))
}

/// Reduce `diff` to at most `budget` tokens.
///
/// `files` lists changed paths; those without a diff section (binary files,
/// mode changes) still appear as stats-only entries.
pub fn build_context(
    diff: &str,
    files: &[String],
    budget: usize,
    counter: &(impl TokenCounter + ?Sized),
    config: &ContextConfig,
) -> ContextOutput {
    let input_tokens = counter.count(diff);
    let output = |text: String, strategy: ContextStrategy, file_count: usize| ContextOutput {
        output_tokens: counter.count(&text),
        text,
        strategy,
        input_tokens,
        file_count,
    };

    let units = with_file_list(parse_diff(diff), files);
    let file_count = units.len();

    if input_tokens <= budget {
        return output(diff.to_string(), ContextStrategy::Passthrough, file_count);
    }

    if !config.summarization_enabled {
        debug!("Summarization disabled, truncating to {} tokens", budget);
        let text = truncate_to_token_limit(diff, budget, counter);
        return output(text, ContextStrategy::Truncated, file_count);
    }

    if units.is_empty() {
        warn!("No file sections found in diff, truncating opaque input");
        let text = truncate_to_token_limit(diff, budget, counter);
        return output(text, ContextStrategy::Truncated, 0);
    }

    let strategy = match config.strategy {
        DiffStrategy::Auto if input_tokens < budget.saturating_mul(2) => DiffStrategy::Summarize,
        DiffStrategy::Auto => DiffStrategy::Batch,
        other => other,
    };
    debug!(
        "Diff is {} tokens over a {} token budget, using {:?} for {} files",
        input_tokens, budget, strategy, file_count
    );

    let (text, applied) = match strategy {
        DiffStrategy::Truncate => (
            truncate_to_token_limit(diff, budget, counter),
            ContextStrategy::Truncated,
        ),
        DiffStrategy::Batch => {
            let scored = prioritize(units, counter, &config.scoring);
            let ceiling = batch_ceiling(budget, config.batch_divisor);
            let batched = BatchSummarizer::new(counter).summarize(diff, &scored, ceiling);
            if config.verbose {
                debug!("Batch sizes: {:?}", batched.batch_sizes);
            }
            (
                truncate_to_token_limit(&batched.text, budget, counter),
                ContextStrategy::Batched,
            )
        }
        DiffStrategy::Summarize | DiffStrategy::Auto => {
            let scored = prioritize(units, counter, &config.scoring);
            let allocation = BudgetAllocator::new(counter)
                .verbose(config.verbose)
                .allocate(diff, &scored, budget);
            if config.verbose {
                for file in &allocation.files {
                    debug!("{} -> {:?} ({} tokens)", file.path, file.inclusion, file.tokens);
                }
            }
            let text = if allocation.tokens_used > budget {
                truncate_to_token_limit(&allocation.text, budget, counter)
            } else {
                allocation.text
            };
            (text, ContextStrategy::Summarized)
        }
    };

    let result = output(text, applied, file_count);
    if config.verbose {
        debug!(
            "Context reduced from {} to {} tokens ({})",
            result.input_tokens, result.output_tokens, result.strategy
        );
    }
    result
}
