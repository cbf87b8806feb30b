//! Greedy token-budget allocation over prioritized files.
//!
//! Each file gets one of three renderings: the full diff, its summary, or a
//! one-line stats fallback. The pass is a heuristic bin-packing policy that
//! favors determinism over optimality: the same inputs always produce the
//! same block.

use tracing::debug;

use crate::tokenizer::TokenCounter;

use super::priority::{FULL_CONTENT_PRIORITY, ScoredFileUnit};

/// Header opening every allocated block.
pub const SUMMARY_HEADER: &str = "=== Diff Summary ===\n\n";

/// Tokens held back for the truncation notice.
pub const TRUNCATION_RESERVE: usize = 16;

/// How a file was rendered into the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    Full,
    Summary,
    Stats,
}

/// One file's allocation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAllocation {
    pub path: String,
    pub inclusion: Inclusion,
    pub tokens: usize,
}

/// Result of one allocation pass.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub text: String,
    /// Sum of the token counts of every emitted piece.
    pub tokens_used: usize,
    pub files: Vec<FileAllocation>,
    /// Files dropped behind the truncation notice.
    pub omitted: usize,
}

impl Allocation {
    fn passthrough(raw: &str, counter: &(impl TokenCounter + ?Sized)) -> Self {
        Self {
            text: raw.to_string(),
            tokens_used: counter.count(raw),
            files: Vec::new(),
            omitted: 0,
        }
    }

    pub fn count(&self, inclusion: Inclusion) -> usize {
        self.files.iter().filter(|f| f.inclusion == inclusion).count()
    }
}

/// Notice appended when files are left out.
pub fn truncation_notice(omitted: usize) -> String {
    format!("... {omitted} more files omitted (token limit)\n")
}

/// Allocates a token budget across prioritized files.
pub struct BudgetAllocator<'a, C: TokenCounter + ?Sized> {
    counter: &'a C,
    verbose: bool,
}

/// Accumulates emitted pieces against the remaining budget.
struct Block<'c, C: TokenCounter + ?Sized> {
    counter: &'c C,
    text: String,
    used: usize,
    remaining: usize,
}

impl<C: TokenCounter + ?Sized> Block<'_, C> {
    /// Append `piece` and charge its tokens, saturating at zero remaining.
    fn emit(&mut self, piece: &str) -> usize {
        let tokens = self.counter.count(piece);
        self.text.push_str(piece);
        self.used += tokens;
        self.remaining = self.remaining.saturating_sub(tokens);
        tokens
    }
}

/// A rendering terminated by a newline, as emitted into the block.
fn piece(content: &str) -> String {
    let mut piece = content.to_string();
    if !piece.ends_with('\n') {
        piece.push('\n');
    }
    piece
}

impl<'a, C: TokenCounter + ?Sized> BudgetAllocator<'a, C> {
    pub fn new(counter: &'a C) -> Self {
        Self {
            counter,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Render `files` (already in descending priority) into at most `budget` tokens.
    ///
    /// With no files, `raw_diff` is returned unchanged. Every rendering is
    /// placed outside [`TRUNCATION_RESERVE`], so the result only exceeds
    /// `budget` when the budget cannot hold the header and the notice.
    pub fn allocate(&self, raw_diff: &str, files: &[ScoredFileUnit], budget: usize) -> Allocation {
        if files.is_empty() {
            return Allocation::passthrough(raw_diff, self.counter);
        }

        let mut block = Block {
            counter: self.counter,
            text: String::new(),
            used: 0,
            remaining: budget,
        };
        block.emit(SUMMARY_HEADER);

        let full_pieces: Vec<String> = files
            .iter()
            .map(|f| {
                if f.unit.raw_content.is_empty() {
                    // Listed without a diff section: the stats line is all there is.
                    f.unit.stats_line()
                } else {
                    piece(&f.unit.raw_content)
                }
            })
            .collect();
        let full_cost: usize = full_pieces.iter().map(|p| self.counter.count(p)).sum();
        if full_cost <= block.remaining {
            if self.verbose {
                debug!("All {} files fit in full ({} tokens)", files.len(), full_cost);
            }
            let mut allocations = Vec::with_capacity(files.len());
            for (file, full) in files.iter().zip(&full_pieces) {
                let tokens = block.emit(full);
                allocations.push(FileAllocation {
                    path: file.unit.path.clone(),
                    inclusion: Inclusion::Full,
                    tokens,
                });
            }
            return Allocation {
                text: block.text,
                tokens_used: block.used,
                files: allocations,
                omitted: 0,
            };
        }

        let mut allocations = Vec::with_capacity(files.len());
        let mut omitted = 0;

        for (idx, (file, full)) in files.iter().zip(&full_pieces).enumerate() {
            let available = block.remaining.saturating_sub(TRUNCATION_RESERVE);
            let Some((inclusion, rendered)) = self.choose(file, full, block.remaining, available)
            else {
                omitted = files.len() - idx;
                block.emit(&truncation_notice(omitted));
                debug!("Token budget exhausted, omitting {} files", omitted);
                break;
            };
            let tokens = block.emit(&rendered);

            if self.verbose {
                debug!(
                    "{} (priority {}) -> {:?}, {} tokens, {} remaining",
                    file.unit.path, file.priority, inclusion, tokens, block.remaining
                );
            }

            allocations.push(FileAllocation {
                path: file.unit.path.clone(),
                inclusion,
                tokens,
            });
        }

        Allocation {
            text: block.text,
            tokens_used: block.used,
            files: allocations,
            omitted,
        }
    }

    /// Pick the richest rendering of `file` that the budget allows, or
    /// `None` once not even the stats line fits.
    fn choose(
        &self,
        file: &ScoredFileUnit,
        full: &str,
        remaining: usize,
        available: usize,
    ) -> Option<(Inclusion, String)> {
        if file.priority >= FULL_CONTENT_PRIORITY
            && file.token_count < remaining / 2
            && self.counter.count(full) <= available
        {
            return Some((Inclusion::Full, full.to_string()));
        }

        let summary = piece(file.unit.summary());
        if self.counter.count(&summary) <= available {
            return Some((Inclusion::Summary, summary));
        }

        let stats = file.unit.stats_line();
        (self.counter.count(&stats) <= available).then_some((Inclusion::Stats, stats))
    }
}
