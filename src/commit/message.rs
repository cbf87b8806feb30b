//! The structured commit message and its rendering.

use serde::{Deserialize, Deserializer};

use crate::config::{CommitConfig, Convention};

/// A commit message decoded from generator output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommitMessage {
    #[serde(rename = "type", default, deserialize_with = "trimmed")]
    pub commit_type: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub scope: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub subject: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub body: Option<String>,
    #[serde(default)]
    pub breaking: bool,
}

/// Decode a possibly-null string, trimmed.
fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()).unwrap_or_default())
}

/// Decode a possibly-null string; blank values become `None`.
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

impl CommitMessage {
    pub fn new(commit_type: &str, subject: &str) -> Self {
        Self {
            commit_type: commit_type.to_string(),
            subject: subject.to_string(),
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn has_body(&self) -> bool {
        self.body.as_ref().is_some_and(|b| !b.trim().is_empty())
    }

    /// The header line under `convention`.
    ///
    /// ```text
    /// conventional: type(scope)!: subject
    /// custom:       template with {type}, {scope}, {subject} substituted
    /// none:         subject
    /// ```
    pub fn header(&self, convention: &Convention) -> String {
        match convention {
            Convention::Conventional => {
                let mut header = self.commit_type.clone();
                if let Some(scope) = &self.scope {
                    header.push('(');
                    header.push_str(scope);
                    header.push(')');
                }
                if self.breaking {
                    header.push('!');
                }
                header.push_str(": ");
                header.push_str(&self.subject);
                header
            }
            Convention::Custom(template) => {
                let template = match &self.scope {
                    Some(_) => template.clone(),
                    None => template.replace("({scope})", ""),
                };
                template
                    .replace("{type}", &self.commit_type)
                    .replace("{scope}", self.scope.as_deref().unwrap_or(""))
                    .replace("{subject}", &self.subject)
            }
            Convention::None => self.subject.clone(),
        }
    }

    /// Header length in characters.
    pub fn header_len(&self, convention: &Convention) -> usize {
        self.header(convention).chars().count()
    }

    /// Format the full message for git.
    ///
    /// Produces:
    /// ```text
    /// type(scope): subject
    ///
    /// - First body line
    /// - Second body line
    /// ```
    ///
    /// The body is rendered only when `include_body` is set. With
    /// `bullet_body`, each non-empty body line gets a `- ` prefix unless it
    /// already carries a bullet.
    pub fn format(&self, config: &CommitConfig) -> String {
        let mut message = self.header(&config.convention);

        if !config.include_body || !self.has_body() {
            return message;
        }
        let Some(body) = self.body.as_deref() else {
            return message;
        };

        message.push_str("\n\n");
        if config.bullet_body {
            let lines: Vec<String> = body
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| {
                    if line.starts_with("- ") || line.starts_with("* ") {
                        line.to_string()
                    } else {
                        format!("- {line}")
                    }
                })
                .collect();
            message.push_str(&lines.join("\n"));
        } else {
            message.push_str(body.trim());
        }

        message
    }
}
