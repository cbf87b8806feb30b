//! Provider identification and safe input-token ceilings.

use std::fmt;
use std::str::FromStr;

/// Ceiling used for providers this crate does not know about.
pub const DEFAULT_TOKEN_LIMIT: usize = 100_000;

/// Supported text-generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Claude,
    Gemini,
    Ollama,
    Mistral,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Claude => "claude",
            Provider::Gemini => "gemini",
            Provider::Ollama => "ollama",
            Provider::Mistral => "mistral",
        }
    }

    /// Conservative input ceiling for `model` on this provider.
    ///
    /// These leave headroom below the advertised context window so the
    /// response still fits.
    pub fn token_limit(&self, model: &str) -> usize {
        let model = model.to_lowercase();
        match self {
            Provider::OpenAi => {
                if model.contains("gpt-3.5-turbo") {
                    if model.contains("16k") { 12_000 } else { 3_000 }
                } else {
                    // gpt-4*, gpt-5*, o1, o3 and unknown OpenAI models
                    100_000
                }
            }
            Provider::Claude => {
                if model.contains("claude-3") || model.contains("claude-4") {
                    180_000
                } else {
                    90_000
                }
            }
            Provider::Gemini => {
                if model.contains("1.5") || model.contains("2.0") || model.contains("2.5") {
                    900_000
                } else {
                    30_000
                }
            }
            Provider::Ollama => 8_000,
            Provider::Mistral => 28_000,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "chatgpt" => Ok(Self::OpenAi),
            "claude" | "anthropic" => Ok(Self::Claude),
            "gemini" | "google" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            "mistral" => Ok(Self::Mistral),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Safe input-token ceiling for a provider/model pair given by name.
pub fn provider_token_limit(provider: &str, model: &str) -> usize {
    provider
        .parse::<Provider>()
        .map(|p| p.token_limit(model))
        .unwrap_or(DEFAULT_TOKEN_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenAI".parse::<Provider>(), Ok(Provider::OpenAi));
        assert_eq!("anthropic".parse::<Provider>(), Ok(Provider::Claude));
        assert_eq!(" ollama ".parse::<Provider>(), Ok(Provider::Ollama));
        assert!("bard".parse::<Provider>().is_err());
    }

    #[test]
    fn test_openai_limits() {
        assert_eq!(provider_token_limit("openai", "gpt-4o"), 100_000);
        assert_eq!(provider_token_limit("openai", "gpt-3.5-turbo"), 3_000);
        assert_eq!(provider_token_limit("openai", "gpt-3.5-turbo-16k"), 12_000);
        assert_eq!(provider_token_limit("openai", "o3-mini"), 100_000);
    }

    #[test]
    fn test_claude_limits() {
        assert_eq!(provider_token_limit("claude", "claude-3-5-sonnet"), 180_000);
        assert_eq!(provider_token_limit("claude", "claude-2.1"), 90_000);
    }

    #[test]
    fn test_gemini_limits() {
        assert_eq!(provider_token_limit("gemini", "gemini-1.5-pro"), 900_000);
        assert_eq!(provider_token_limit("gemini", "gemini-1.0-pro"), 30_000);
    }

    #[test]
    fn test_fixed_and_unknown_limits() {
        assert_eq!(provider_token_limit("ollama", "llama3"), 8_000);
        assert_eq!(provider_token_limit("mistral", "mistral-large"), 28_000);
        assert_eq!(provider_token_limit("unknown", "whatever"), DEFAULT_TOKEN_LIMIT);
    }

    #[test]
    fn test_provider_display() {
        assert_eq!(Provider::OpenAi.to_string(), "openai");
        assert_eq!(Provider::Claude.to_string(), "claude");
    }
}
