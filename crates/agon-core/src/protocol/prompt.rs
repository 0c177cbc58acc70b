//! Prompt types handed to an LLM client.
//!
//! A prompt is an ordered list of `PromptMessage`s. Only two voices exist:
//! system-level context and user turns. Prior assistant output is replayed as
//! system context, never as a peer turn.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: PromptRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: PromptRole::User, content: content.into() }
    }
}

/// Sampling knobs forwarded verbatim to the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Result of one successful provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// Completion token count when the provider reports one.
    pub completion_tokens: Option<u64>,
}

impl Generation {
    /// Token count for metrics. Falls back to character count, which is only a
    /// rough proxy for real tokenization.
    pub fn token_estimate(&self) -> u64 {
        self.completion_tokens
            .unwrap_or_else(|| self.text.chars().count() as u64)
    }
}
