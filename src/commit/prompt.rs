//! Prompt construction for the commit message generation call.
//!
//! The system prompt carries the convention rules and limits; the user
//! prompt carries the budgeted diff context as a JSON specification so the
//! reply comes back in the shape [`super::normalize`] parses first.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde_json::{Value, json};

use crate::config::{CommitConfig, Convention};

static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("ANSI escape pattern is valid")
});

/// Descriptions for the well-known conventional types.
const TYPE_DESCRIPTIONS: &[(&str, &str)] = &[
    ("feat", "A new feature"),
    ("fix", "A bug fix"),
    ("docs", "Documentation only changes"),
    (
        "style",
        "Changes that do not affect the meaning of the code (whitespace, formatting)",
    ),
    (
        "refactor",
        "A code change that neither fixes a bug nor adds a feature",
    ),
    ("perf", "A code change that improves performance"),
    ("test", "Adding missing tests or correcting existing tests"),
    (
        "build",
        "Changes that affect the build system or external dependencies",
    ),
    ("ci", "Changes to CI configuration files and scripts"),
    ("chore", "Other changes that don't modify source or test files"),
    ("revert", "Reverts a previous commit"),
];

fn type_description(commit_type: &str) -> Option<&'static str> {
    TYPE_DESCRIPTIONS
        .iter()
        .find(|(name, _)| *name == commit_type)
        .map(|(_, description)| *description)
}

fn body_rule(config: &CommitConfig) -> String {
    if config.include_body {
        format!(
            "A body is REQUIRED and must not be empty. Keep it under {} characters and describe only the essential technical changes. Never include line statistics, file lists or diff metadata.",
            config.max_body_length
        )
    } else {
        "Do not include a body, only provide the header line.".to_string()
    }
}

/// Build the system prompt for `config`'s convention and limits.
pub fn build_system_prompt(config: &CommitConfig) -> String {
    let max = config.max_length;
    let mut parts: Vec<String> = Vec::new();

    match &config.convention {
        Convention::Conventional => {
            parts.push(
                "Generate a concise git commit message written in present tense for the following code changes."
                    .to_string(),
            );
            parts.push(format!(
                "Your response MUST start with a commit type followed by a colon. Valid types are: {}.",
                config.allowed_types.join(", ")
            ));
            parts.push("INCORRECT: ': description of changes' (no commit type)".to_string());
            parts.push("CORRECT: 'feat: add new feature'".to_string());
            parts.push(format!(
                "HARD LIMIT: the whole header 'type(scope): subject' MUST NOT exceed {max} characters, type and scope included."
            ));
            parts.push(body_rule(config));

            let types: Vec<String> = config
                .allowed_types
                .iter()
                .map(|t| match type_description(t) {
                    Some(description) => format!("- {t}: {description}"),
                    None => format!("- {t}"),
                })
                .collect();
            parts.push(format!(
                "Choose the type that best describes the change:\n{}",
                types.join("\n")
            ));

            let examples = ["fix: update validation logic", "feat(auth): add login timeout"];
            let examples: Vec<String> = examples
                .iter()
                .map(|e| format!("- {e} ({} chars)", e.chars().count()))
                .collect();
            parts.push(format!(
                "Examples of headers within the {max} character limit:\n{}",
                examples.join("\n")
            ));
        }
        Convention::Custom(template) => {
            parts.push(
                "You are an expert developer who writes clear, concise git commit messages."
                    .to_string(),
            );
            parts.push(format!(
                "The header is rendered from the template '{template}'. Fill in type, scope and subject accordingly."
            ));
            parts.push(format!(
                "The rendered header MUST NOT exceed {max} characters."
            ));
            parts.push(body_rule(config));
        }
        Convention::None => {
            parts.push(format!(
                "You are an expert developer who writes clear, concise, and descriptive git commit messages that do not exceed {max} characters in the subject line."
            ));
            parts.push(body_rule(config));
        }
    }

    parts.join("\n")
}

/// Build the user prompt: instructions plus a JSON specification holding
/// the changed paths and the diff context.
pub fn build_commit_prompt(context: &str, files: &[String], config: &CommitConfig) -> String {
    let changes = sanitize_context(context);
    let conventional = config.convention.is_conventional();

    let response_format = match &config.convention {
        Convention::None => json!({"subject": "", "body": ""}),
        _ => json!({"type": "", "scope": "", "subject": "", "body": ""}),
    };
    let convention = match &config.convention {
        Convention::Conventional => json!({
            "type": "conventional",
            "types": config.allowed_types,
            "format": "type(scope): subject",
        }),
        Convention::Custom(template) => json!({"type": "custom", "template": template}),
        Convention::None => Value::Null,
    };
    let spec = json!({
        "instruction": "Generate a commit message describing the changes",
        "convention": convention,
        "format": {
            "max_subject_length": config.max_length,
            "max_body_length": config.max_body_length,
            "include_body": config.include_body,
        },
        "context": {
            "files": files,
            "changes": changes,
        },
        "output": {
            "format": "json",
            "subject_only": !config.include_body,
            "response_format": response_format,
        },
    });

    let example = if conventional {
        r#"{"type": "feat", "scope": "optional scope", "subject": "concise subject", "body": "what changed"}"#
    } else if matches!(config.convention, Convention::None) {
        r#"{"subject": "concise subject", "body": "what changed"}"#
    } else {
        r#"{"type": "fix", "scope": "", "subject": "concise subject", "body": "what changed"}"#
    };
    let body_line = if config.include_body {
        format!(
            "- Body: brief bullet points of the actual changes, at most {} characters",
            config.max_body_length
        )
    } else {
        "- Body: leave empty".to_string()
    };

    format!(
        r#"Create a CONCISE commit message for the changes specified below.

## Rules
- Subject: lowercase, imperative mood, NO period at the end
- Header: at most {max} characters in total
{body_line}
- Focus on what the code changes accomplish, not on which files changed
- No introduction, explanation or conclusion

## Output Format
Respond with ONLY a JSON object (no markdown, no explanation):
{example}

## Specification
{spec:#}"#,
        max = config.max_length,
    )
}

/// Strip ANSI escapes and control characters other than newline and tab.
pub fn sanitize_context(text: &str) -> String {
    ANSI_RE
        .replace_all(text, "")
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}
