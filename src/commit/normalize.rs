//! Parse, fit, validate and repair generator output.
//!
//! ```text
//! raw ─parse─> message ─body/length─> validate ─ok─> Structured
//!                                        │
//!                                        └─fail─> repair ─body/length─> validate ─ok─> Repaired
//!                                                                          └─fail─> Unresolved
//! ```
//!
//! Repair runs at most once, so normalization always terminates.

use tracing::{debug, warn};

use crate::config::CommitConfig;
use crate::error::NormalizeError;

use super::body::{default_body, unbullet};
use super::length::{LengthAdjustment, enforce_lengths};
use super::message::CommitMessage;
use super::parse::{HeaderSyntax, ParseOptions, ParseStrategy, parse_message};
use super::repair::{RepairAction, repair};
use super::validate::validate;

/// How the final message was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeState {
    /// Valid as parsed (after length fitting).
    Structured,
    /// Valid after the repair pass.
    Repaired,
}

/// A validated commit message.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub message: CommitMessage,
    /// The message formatted for git.
    pub rendered: String,
    pub state: NormalizeState,
    pub strategy: ParseStrategy,
    pub adjustments: Vec<LengthAdjustment>,
    pub repairs: Vec<RepairAction>,
}

/// Fill a mandated body that is missing.
fn ensure_body(msg: &mut CommitMessage, files: &[String], config: &CommitConfig) {
    if config.include_body && !msg.has_body() {
        msg.body = Some(default_body(files));
        if config.verbose {
            debug!("Injected default body for {} files", files.len());
        }
    }
}

/// Turn raw generator output into a validated commit message.
///
/// `files` is the list of changed paths, used to synthesize a body when one
/// is required and the output has none.
pub fn normalize(
    raw: &str,
    files: &[String],
    config: &CommitConfig,
) -> Result<Normalized, NormalizeError> {
    if raw.trim().is_empty() {
        return Err(NormalizeError::EmptyResponse);
    }

    let opts = ParseOptions {
        default_type: &config.default_type,
        syntax: HeaderSyntax::for_convention(&config.convention),
    };
    let (mut message, strategy) = parse_message(raw, opts);
    if strategy == ParseStrategy::Fallback {
        warn!("Could not parse generator output, using it as the subject");
    }
    if config.bullet_body {
        message.body = message
            .body
            .as_deref()
            .map(unbullet)
            .filter(|b| !b.is_empty());
    }

    ensure_body(&mut message, files, config);
    let mut adjustments = enforce_lengths(&mut message, config);

    let violation = match validate(&message, config) {
        Ok(()) => {
            return Ok(Normalized {
                rendered: message.format(config),
                message,
                state: NormalizeState::Structured,
                strategy,
                adjustments,
                repairs: Vec::new(),
            });
        }
        Err(violation) => violation,
    };
    debug!("Validation failed ({}), attempting repair", violation);

    let repairs = repair(&mut message, config);
    ensure_body(&mut message, files, config);
    adjustments.extend(enforce_lengths(&mut message, config));

    match validate(&message, config) {
        Ok(()) => Ok(Normalized {
            rendered: message.format(config),
            message,
            state: NormalizeState::Repaired,
            strategy,
            adjustments,
            repairs,
        }),
        Err(violation) => {
            warn!("Commit message still invalid after repair: {}", violation);
            Err(NormalizeError::Unresolved {
                violation,
                rendered: message.format(config),
                message: Box::new(message),
                raw: raw.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Convention;
    use crate::error::ValidationError;

    fn files(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_clean_json_is_structured() {
        let raw = r#"{"type": "feat", "scope": "api", "subject": "add pagination", "body": "Use cursor tokens for listing"}"#;
        let out = normalize(raw, &[], &CommitConfig::conventional()).unwrap();
        assert_eq!(out.state, NormalizeState::Structured);
        assert_eq!(out.strategy, ParseStrategy::EmbeddedJson);
        assert_eq!(out.rendered, "feat(api): add pagination\n\n- Use cursor tokens for listing");
    }

    #[test]
    fn test_repairable_output_is_repaired() {
        let raw = "Feature(API): Add pagination.\n\nThis commit adds cursor tokens";
        let out = normalize(raw, &[], &CommitConfig::conventional()).unwrap();
        assert_eq!(out.state, NormalizeState::Repaired);
        assert_eq!(out.message.commit_type, "feat");
        assert_eq!(out.message.scope.as_deref(), Some("api"));
        assert_eq!(out.message.subject, "add pagination");
        assert_eq!(out.message.body.as_deref(), Some("Adds cursor tokens"));
    }

    #[test]
    fn test_missing_body_gets_default() {
        let out = normalize("fix: close handles", &files(&["src/io.rs"]), &CommitConfig::conventional())
            .unwrap();
        assert_eq!(out.state, NormalizeState::Structured);
        assert_eq!(out.message.body.as_deref(), Some("Update Rust implementation in io.rs"));
    }

    #[test]
    fn test_unknown_type_is_unresolved_with_raw_fallback() {
        let raw = "wip: half done\n\nStill exploring the allocator";
        let err = normalize(raw, &[], &CommitConfig::conventional()).unwrap_err();
        match &err {
            NormalizeError::Unresolved { violation, rendered, .. } => {
                assert!(matches!(violation, ValidationError::TypeNotAllowed { .. }));
                assert!(rendered.starts_with("wip: half done"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.raw_fallback(), Some(raw));
    }

    #[test]
    fn test_empty_response() {
        assert!(matches!(
            normalize("  \n", &[], &CommitConfig::default()),
            Err(NormalizeError::EmptyResponse)
        ));
    }

    #[test]
    fn test_plain_convention_renders_subject() {
        let config = CommitConfig {
            include_body: false,
            ..CommitConfig::default()
        };
        let out = normalize("feat: Add search", &[], &config).unwrap();
        assert_eq!(config.convention, Convention::None);
        assert_eq!(out.rendered, "feat: Add search");
    }

    #[test]
    fn test_plain_convention_output_is_stable() {
        let config = CommitConfig {
            include_body: false,
            ..CommitConfig::default()
        };
        let first = normalize("fix: Resolve: edge case", &[], &config).unwrap();
        let second = normalize(&first.rendered, &[], &config).unwrap();

        assert_eq!(first.rendered, "fix: Resolve: edge case");
        assert_eq!(second.rendered, first.rendered);
        assert_eq!(second.message, first.message);
    }

    #[test]
    fn test_rendered_output_renormalizes_to_same_fields() {
        let config = CommitConfig::conventional();
        let raw = "refactor(diff): split allocator\n\nMove batching into its own module\nKeep the greedy pass deterministic";
        let first = normalize(raw, &[], &config).unwrap();
        let second = normalize(&first.rendered, &[], &config).unwrap();
        assert_eq!(first.message, second.message);
        assert_eq!(first.rendered, second.rendered);
    }
}
