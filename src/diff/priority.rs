//! Static priority heuristics for changed files.
//!
//! Scores come from a table of `(pattern, category, weight)` rules. Within
//! one category the first matching rule wins; categories add up. The final
//! score is clamped at zero.

use crate::config::ScoringConfig;
use crate::tokenizer::TokenCounter;

use super::parser::{FileStatus, FileUnit};

/// Priority at or above which a file may be included in full.
pub const FULL_CONTENT_PRIORITY: i64 = 100;

/// How a rule matches a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPattern {
    /// File extension, without the dot.
    Extension(&'static str),
    /// Substring of the file name.
    FileNameContains(&'static str),
    /// Prefix of the file name.
    FileNamePrefix(&'static str),
    /// A directory segment anywhere in the path (`tests/`).
    Segment(&'static str),
}

impl PathPattern {
    pub fn matches(&self, path: &str) -> bool {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        match self {
            PathPattern::Extension(ext) => file_name
                .rsplit_once('.')
                .is_some_and(|(_, e)| e.eq_ignore_ascii_case(ext)),
            PathPattern::FileNameContains(needle) => file_name.contains(needle),
            PathPattern::FileNamePrefix(prefix) => file_name.starts_with(prefix),
            PathPattern::Segment(segment) => has_segment(path, segment),
        }
    }
}

/// Rule categories; one rule per category can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    TestFile,
    Kind,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreRule {
    pub pattern: PathPattern,
    pub category: RuleCategory,
    pub weight: i64,
}

const fn rule(pattern: PathPattern, category: RuleCategory, weight: i64) -> ScoreRule {
    ScoreRule { pattern, category, weight }
}

use PathPattern::{Extension, FileNameContains, FileNamePrefix, Segment};
use RuleCategory::{Kind, TestFile};

/// File-kind rules in evaluation order.
pub const SCORE_RULES: &[ScoreRule] = &[
    // Test naming conventions
    rule(FileNameContains("_test."), TestFile, -20),
    rule(FileNameContains(".test."), TestFile, -20),
    rule(FileNameContains(".spec."), TestFile, -20),
    rule(FileNamePrefix("test_"), TestFile, -20),
    rule(Segment("tests/"), TestFile, -20),
    rule(Segment("__tests__/"), TestFile, -20),
    // Source code
    rule(Extension("rs"), Kind, 30),
    rule(Extension("go"), Kind, 30),
    rule(Extension("py"), Kind, 30),
    rule(Extension("js"), Kind, 30),
    rule(Extension("jsx"), Kind, 30),
    rule(Extension("ts"), Kind, 30),
    rule(Extension("tsx"), Kind, 30),
    rule(Extension("java"), Kind, 30),
    rule(Extension("kt"), Kind, 30),
    rule(Extension("c"), Kind, 30),
    rule(Extension("h"), Kind, 30),
    rule(Extension("cc"), Kind, 30),
    rule(Extension("cpp"), Kind, 30),
    rule(Extension("hpp"), Kind, 30),
    rule(Extension("cs"), Kind, 30),
    rule(Extension("rb"), Kind, 30),
    rule(Extension("swift"), Kind, 30),
    rule(Extension("scala"), Kind, 30),
    rule(Extension("php"), Kind, 30),
    // Documentation
    rule(Extension("md"), Kind, -30),
    rule(Extension("markdown"), Kind, -30),
    rule(Extension("rst"), Kind, -30),
    rule(Extension("adoc"), Kind, -30),
    rule(Extension("txt"), Kind, -30),
    // Structured configuration
    rule(Extension("json"), Kind, 10),
    rule(Extension("yaml"), Kind, 10),
    rule(Extension("yml"), Kind, 10),
    rule(Extension("toml"), Kind, 10),
    rule(Extension("xml"), Kind, 10),
    rule(Extension("ini"), Kind, 10),
];

/// Bonus for newly added files.
const ADDED_BONUS: i64 = 20;
/// Penalty for deleted files.
const DELETED_PENALTY: i64 = -30;

/// A file unit with its priority and memoized token count.
#[derive(Debug, Clone)]
pub struct ScoredFileUnit {
    pub unit: FileUnit,
    pub priority: i64,
    pub token_count: usize,
}

/// Whether `path` contains `segment` at a directory boundary.
fn has_segment(path: &str, segment: &str) -> bool {
    path.starts_with(segment)
        || path
            .match_indices(segment)
            .any(|(idx, _)| path[..idx].ends_with('/'))
}

/// Score one file. Pure and never negative.
pub fn score(unit: &FileUnit, config: &ScoringConfig) -> i64 {
    let path = unit.path.as_str();
    let mut score = 0i64;

    if let Some(location) = config.locations.iter().find(|l| has_segment(path, &l.marker)) {
        score += location.weight;
    }

    score += unit.total_changes().min(config.size_cap) as i64;

    for category in [TestFile, Kind] {
        if let Some(rule) = SCORE_RULES
            .iter()
            .find(|r| r.category == category && r.pattern.matches(path))
        {
            score += rule.weight;
        }
    }

    match unit.status {
        FileStatus::Added => score += ADDED_BONUS,
        FileStatus::Deleted => score += DELETED_PENALTY,
        FileStatus::Modified | FileStatus::Renamed => {}
    }

    score.max(0)
}

/// Score, count, and order units by descending priority.
///
/// The sort is stable, so equal priorities keep diff order.
pub fn prioritize(
    units: Vec<FileUnit>,
    counter: &(impl TokenCounter + ?Sized),
    config: &ScoringConfig,
) -> Vec<ScoredFileUnit> {
    let mut scored: Vec<ScoredFileUnit> = units
        .into_iter()
        .map(|unit| ScoredFileUnit {
            priority: score(&unit, config),
            token_count: counter.count(&unit.raw_content),
            unit,
        })
        .collect();

    scored.sort_by(|a, b| b.priority.cmp(&a.priority));
    scored
}
