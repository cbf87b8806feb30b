//! Configuration values threaded explicitly through the pipeline.
//!
//! Nothing here is global: every entry point takes the relevant config by
//! reference. All structs deserialize with defaults for missing fields so
//! embedding callers can load them from any serde format.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub context: ContextConfig,
    pub commit: CommitConfig,
}

/// How an oversized diff is reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStrategy {
    /// Summarize when the diff is under twice the budget, batch otherwise.
    #[default]
    Auto,
    Summarize,
    Batch,
    Truncate,
}

impl FromStr for DiffStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "summarize" => Ok(Self::Summarize),
            "batch" => Ok(Self::Batch),
            "truncate" => Ok(Self::Truncate),
            _ => Err(format!("Unknown diff strategy: {}", s)),
        }
    }
}

/// A path marker that raises a file's priority.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationRule {
    /// Directory prefix matched at a segment boundary, e.g. `pkg/ai/`.
    pub marker: String,
    pub weight: i64,
}

impl LocationRule {
    pub fn new(marker: &str, weight: i64) -> Self {
        Self {
            marker: marker.to_string(),
            weight,
        }
    }
}

/// Priority scoring knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Location rules, first match wins.
    pub locations: Vec<LocationRule>,
    /// Cap on the change-size term.
    pub size_cap: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            locations: vec![
                LocationRule::new("pkg/ai/", 100),
                LocationRule::new("pkg/git/", 80),
                LocationRule::new("cmd/", 60),
                LocationRule::new("pkg/", 40),
                LocationRule::new("src/", 40),
                LocationRule::new("internal/", 40),
                LocationRule::new("lib/", 40),
            ],
            size_cap: 50,
        }
    }
}

/// Context-building configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// When false, oversized diffs are only truncated.
    pub summarization_enabled: bool,
    pub strategy: DiffStrategy,
    /// Explicit input-token ceiling; 0 means "use the provider limit".
    pub max_input_tokens: usize,
    /// Fraction of the ceiling offered to the context.
    pub safety_ratio: f64,
    /// Per-batch ceiling is `budget / batch_divisor`.
    pub batch_divisor: usize,
    /// Model whose tokenizer counts tokens; empty means the generation model.
    pub tokenizer_model: String,
    pub scoring: ScoringConfig,
    /// Emit detailed debug traces.
    pub verbose: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            summarization_enabled: true,
            strategy: DiffStrategy::Auto,
            max_input_tokens: 0,
            safety_ratio: 0.8,
            batch_divisor: 10,
            tokenizer_model: String::new(),
            scoring: ScoringConfig::default(),
            verbose: false,
        }
    }
}

impl ContextConfig {
    /// Token budget for the context given the provider's safe ceiling.
    pub fn resolve_budget(&self, provider_limit: usize) -> usize {
        let ceiling = match self.max_input_tokens {
            0 => provider_limit,
            n => n.min(provider_limit),
        };
        (ceiling as f64 * self.safety_ratio.clamp(0.0, 1.0)) as usize
    }

    /// Model used for token counting.
    pub fn tokenizer_model<'a>(&'a self, generation_model: &'a str) -> &'a str {
        if self.tokenizer_model.is_empty() {
            generation_model
        } else {
            &self.tokenizer_model
        }
    }
}

/// Commit message convention.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Convention {
    /// Subject line only, no structural rules.
    #[default]
    None,
    /// `type(scope): subject`.
    Conventional,
    /// Header rendered from a template with `{type}`, `{scope}`, `{subject}`.
    Custom(String),
}

impl Convention {
    pub fn is_conventional(&self) -> bool {
        matches!(self, Convention::Conventional)
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Convention::None => write!(f, "none"),
            Convention::Conventional => write!(f, "conventional"),
            Convention::Custom(_) => write!(f, "custom"),
        }
    }
}

/// Conventional commit types accepted by default.
pub const DEFAULT_COMMIT_TYPES: &[&str] = &[
    "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore", "revert",
];

/// Commit message normalization configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    pub convention: Convention,
    /// Body is mandatory and rendered.
    pub include_body: bool,
    /// Ceiling for the whole rendered header line.
    pub max_length: usize,
    pub max_body_length: usize,
    pub allowed_types: Vec<String>,
    /// Type used when the output names none.
    pub default_type: String,
    /// Subject forced when nothing else fits the header.
    pub placeholder_subject: String,
    /// Common misspellings mapped to canonical types.
    pub type_synonyms: BTreeMap<String, String>,
    /// Subjects (and scopes) too generic to accept, with their replacement.
    pub generic_subjects: BTreeMap<String, String>,
    /// Render body lines as `- ` bullets.
    pub bullet_body: bool,
    /// Emit detailed debug traces.
    pub verbose: bool,
}

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            convention: Convention::None,
            include_body: true,
            max_length: 72,
            max_body_length: 500,
            allowed_types: DEFAULT_COMMIT_TYPES.iter().map(|t| t.to_string()).collect(),
            default_type: "chore".to_string(),
            placeholder_subject: "changes".to_string(),
            type_synonyms: string_map(&[
                ("feature", "feat"),
                ("features", "feat"),
                ("bugfix", "fix"),
                ("hotfix", "fix"),
                ("document", "docs"),
                ("documentation", "docs"),
                ("doc", "docs"),
                ("styling", "style"),
                ("refactoring", "refactor"),
                ("performance", "perf"),
                ("testing", "test"),
                ("tests", "test"),
                ("building", "build"),
                ("maintenance", "chore"),
            ]),
            generic_subjects: string_map(&[
                ("update", "improve"),
                ("change", "adjust"),
                ("modify", "enhance"),
                ("add", "implement"),
                ("remove", "drop"),
                ("delete", "drop"),
                ("fix", "resolve"),
            ]),
            bullet_body: true,
            verbose: false,
        }
    }
}

impl CommitConfig {
    /// Conventional commits with the remaining defaults.
    pub fn conventional() -> Self {
        Self {
            convention: Convention::Conventional,
            ..Self::default()
        }
    }

    pub fn is_allowed_type(&self, commit_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == commit_type)
    }

    /// Replacement for a deny-listed generic word, if `word` is one.
    pub fn generic_replacement(&self, word: &str) -> Option<&str> {
        self.generic_subjects
            .get(&word.to_lowercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert!(cfg.context.summarization_enabled);
        assert_eq!(cfg.context.strategy, DiffStrategy::Auto);
        assert_eq!(cfg.commit.max_length, 72);
        assert_eq!(cfg.commit.max_body_length, 500);
        assert_eq!(cfg.commit.convention, Convention::None);
        assert!(cfg.commit.is_allowed_type("revert"));
        assert!(!cfg.commit.is_allowed_type("feature"));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let json = r#"{"commit": {"convention": "conventional", "max_length": 50}, "context": {"strategy": "batch"}}"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert!(cfg.commit.convention.is_conventional());
        assert_eq!(cfg.commit.max_length, 50);
        assert_eq!(cfg.commit.default_type, "chore");
        assert_eq!(cfg.context.strategy, DiffStrategy::Batch);
        assert_eq!(cfg.context.batch_divisor, 10);
    }

    #[test]
    fn test_deserialize_custom_convention() {
        let json = r#"{"convention": {"custom": "[{type}] {subject}"}}"#;
        let cfg: CommitConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.convention, Convention::Custom("[{type}] {subject}".to_string()));
    }

    #[test]
    fn test_resolve_budget() {
        let mut cfg = ContextConfig::default();
        assert_eq!(cfg.resolve_budget(10_000), 8_000);

        cfg.max_input_tokens = 5_000;
        assert_eq!(cfg.resolve_budget(10_000), 4_000);

        cfg.max_input_tokens = 50_000;
        assert_eq!(cfg.resolve_budget(10_000), 8_000);
    }

    #[test]
    fn test_tokenizer_model_falls_back_to_generation_model() {
        let mut cfg = ContextConfig::default();
        assert_eq!(cfg.tokenizer_model("gpt-4o"), "gpt-4o");
        cfg.tokenizer_model = "cl100k_base".to_string();
        assert_eq!(cfg.tokenizer_model("gpt-4o"), "cl100k_base");
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Summarize".parse::<DiffStrategy>(), Ok(DiffStrategy::Summarize));
        assert!("shrink".parse::<DiffStrategy>().is_err());
    }

    #[test]
    fn test_generic_replacement_is_case_insensitive() {
        let cfg = CommitConfig::default();
        assert_eq!(cfg.generic_replacement("Update"), Some("improve"));
        assert_eq!(cfg.generic_replacement("add retry loop"), None);
    }
}
