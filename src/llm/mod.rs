//! Provider token limits and JSON recovery from model output.

pub mod json;
pub mod provider;

pub use json::brace_candidates;
pub use provider::{DEFAULT_TOKEN_LIMIT, Provider, provider_token_limit};
