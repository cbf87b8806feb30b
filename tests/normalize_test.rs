//! Integration tests for normalizing generator output into commit messages.

mod common;

use commitron::commit::{NormalizeState, ParseStrategy, normalize};
use commitron::config::{CommitConfig, Convention};
use commitron::error::{NormalizeError, ValidationError};

use common::read_fixture;

fn conventional() -> CommitConfig {
    CommitConfig::conventional()
}

#[test]
fn test_bare_colon_header_gets_default_type() {
    let out = normalize(": add feature", &[], &conventional()).unwrap();
    assert_eq!(out.message.commit_type, "chore");
    assert_eq!(out.message.subject, "add feature");
    assert!(out.rendered.starts_with("chore: add feature\n\n"));
}

#[test]
fn test_long_header_fits_max_length() {
    let config = CommitConfig {
        max_length: 30,
        include_body: false,
        ..conventional()
    };
    let raw = "feat(very-long-scope-name): this is a subject that is far too long for the limit";

    let out = normalize(raw, &[], &config).unwrap();

    assert!(out.rendered.chars().count() <= 30, "{}", out.rendered);
    assert!(out.rendered.starts_with("feat"));
    assert!(!out.adjustments.is_empty());
}

#[test]
fn test_fenced_json_response() {
    let raw = read_fixture("responses/fenced_json.txt");
    let out = normalize(&raw, &[], &conventional()).unwrap();

    assert_eq!(out.strategy, ParseStrategy::EmbeddedJson);
    assert_eq!(out.state, NormalizeState::Structured);
    assert_eq!(
        out.rendered,
        "feat(ai): add token limit to client\n\n- Pass the limit through NewClient\n- Drop the unused constructor"
    );
}

#[test]
fn test_marked_response_is_repaired() {
    let raw = read_fixture("responses/marked.txt");
    let out = normalize(&raw, &[], &conventional()).unwrap();

    assert_eq!(out.strategy, ParseStrategy::HeuristicText);
    assert_eq!(out.state, NormalizeState::Repaired);
    assert_eq!(
        out.rendered,
        "fix(parser): handle renamed files\n\n- The parser tracks old paths for renames"
    );
}

#[test]
fn test_labeled_response() {
    let raw = read_fixture("responses/labeled.txt");
    let out = normalize(&raw, &[], &conventional()).unwrap();

    assert_eq!(out.strategy, ParseStrategy::HeuristicText);
    assert_eq!(out.message.commit_type, "docs");
    assert_eq!(out.message.subject, "describe budget flags");
    assert_eq!(
        out.message.body.as_deref(),
        Some("Explain how --budget overrides the provider limit")
    );
}

#[test]
fn test_normalizing_rendered_output_is_stable() {
    for name in ["fenced_json.txt", "marked.txt", "labeled.txt"] {
        let raw = read_fixture(&format!("responses/{name}"));
        let first = normalize(&raw, &[], &conventional()).unwrap();
        let second = normalize(&first.rendered, &[], &conventional()).unwrap();

        assert_eq!(second.state, NormalizeState::Structured, "{name}");
        assert_eq!(first.message, second.message, "{name}");
        assert_eq!(first.rendered, second.rendered, "{name}");
    }
}

#[test]
fn test_custom_template_convention() {
    let config = CommitConfig {
        convention: Convention::Custom("[{type}] {subject}".to_string()),
        ..conventional()
    };
    let raw = r#"{"type": "fix", "subject": "handle timeout", "body": "Retry the request once"}"#;

    let out = normalize(raw, &[], &config).unwrap();
    assert_eq!(out.rendered, "[fix] handle timeout\n\n- Retry the request once");
}

#[test]
fn test_unknown_type_surfaces_raw_fallback() {
    let raw = "yolo: ship it\n\nNo time to explain the change";
    let err = normalize(raw, &[], &conventional()).unwrap_err();

    match &err {
        NormalizeError::Unresolved { violation, .. } => {
            assert!(matches!(violation, ValidationError::TypeNotAllowed { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.raw_fallback(), Some(raw));
}
