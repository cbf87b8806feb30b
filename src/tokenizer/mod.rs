//! Token counting and token-aware truncation.
//!
//! The budgeting code only ever talks to [`TokenCounter`], so it can treat
//! the tokenizer as a pure black box (and tests can swap in a mock).

use tiktoken_rs::{CoreBPE, cl100k_base, get_bpe_from_model, o200k_base};
use tracing::debug;

/// Marker appended when [`truncate_to_token_limit`] cuts text.
pub const TRUNCATION_MARKER: &str = "...[truncated to fit token limit]";

/// Average characters per token used when no BPE is available.
const CHARS_PER_TOKEN: f64 = 3.5;

/// Counts tokens for a fixed model.
///
/// Implementations must be deterministic and return 0 for empty text.
#[cfg_attr(test, mockall::automock)]
pub trait TokenCounter {
    fn count(&self, text: &str) -> usize;
}

/// Token counter resolved from a model identifier.
pub enum Tokenizer {
    /// Byte pair encoding from tiktoken.
    Bpe(CoreBPE),
    /// `ceil(chars / 3.5)` estimate for models with no known encoding.
    Heuristic,
}

impl Tokenizer {
    /// Resolve a tokenizer for `model`.
    ///
    /// Accepts model names known to tiktoken (`gpt-4o`, `gpt-3.5-turbo`, ...)
    /// or the encoding names `cl100k_base` / `o200k_base`. Anything else
    /// falls back to the character heuristic.
    pub fn for_model(model: &str) -> Self {
        let lower = model.trim().to_ascii_lowercase();

        let bpe = match get_bpe_from_model(&lower) {
            Ok(bpe) => Some(bpe),
            Err(_) => match lower.as_str() {
                "cl100k_base" => cl100k_base().ok(),
                "o200k_base" => o200k_base().ok(),
                _ => None,
            },
        };

        match bpe {
            Some(bpe) => Tokenizer::Bpe(bpe),
            None => {
                debug!("No BPE encoding for model '{}', using character heuristic", model);
                Tokenizer::Heuristic
            }
        }
    }

    pub fn is_heuristic(&self) -> bool {
        matches!(self, Tokenizer::Heuristic)
    }
}

impl TokenCounter for Tokenizer {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self {
            Tokenizer::Bpe(bpe) => bpe.encode_ordinary(text).len(),
            Tokenizer::Heuristic => estimate_tokens(text),
        }
    }
}

/// Character-count estimate of a token count.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() as f64 / CHARS_PER_TOKEN).ceil() as usize
}

/// Count tokens of `text` under `model`.
///
/// Convenience wrapper that resolves a [`Tokenizer`] per call. Prefer
/// holding a `Tokenizer` when counting many strings.
pub fn count_tokens(text: &str, model: &str) -> usize {
    Tokenizer::for_model(model).count(text)
}

/// Truncate `text` so that its token count, marker included, fits `max_tokens`.
///
/// Cuts at line boundaries. When not even the first line fits, that line is
/// cut by characters instead. If the marker alone does not fit, the result
/// is empty.
pub fn truncate_to_token_limit(
    text: &str,
    max_tokens: usize,
    counter: &(impl TokenCounter + ?Sized),
) -> String {
    if counter.count(text) <= max_tokens {
        return text.to_string();
    }

    let marker_tokens = counter.count(TRUNCATION_MARKER);
    if marker_tokens > max_tokens {
        return String::new();
    }
    let line_budget = max_tokens - marker_tokens;

    let mut kept = String::new();
    let mut used = 0usize;

    for line in text.split_inclusive('\n') {
        let line_tokens = counter.count(line);
        if used + line_tokens > line_budget {
            if kept.is_empty() {
                kept = char_prefix_within(line, line_budget, counter);
                if !kept.is_empty() && !kept.ends_with('\n') {
                    kept.push('\n');
                }
            }
            break;
        }
        kept.push_str(line);
        used += line_tokens;
    }

    debug!(
        "Truncated text from {} to {} chars to fit {} tokens",
        text.len(),
        kept.len(),
        max_tokens
    );

    kept.push_str(TRUNCATION_MARKER);
    kept
}

/// Longest character prefix of `line` (plus a newline) that fits `budget`.
fn char_prefix_within(line: &str, budget: usize, counter: &(impl TokenCounter + ?Sized)) -> String {
    let chars: Vec<char> = line.trim_end_matches('\n').chars().collect();
    let fits = |n: usize| {
        let mut candidate: String = chars[..n].iter().collect();
        candidate.push('\n');
        counter.count(&candidate) <= budget
    };

    let (mut lo, mut hi) = (0usize, chars.len());
    while lo < hi {
        let mid = (lo + hi).div_ceil(2);
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    chars[..lo].iter().collect()
}
