//! LLM client seam.
//!
//! The chat service only sees `LlmClient`: one call per request with an
//! ordered prompt and sampling knobs. Providers live behind this trait so the
//! HTTP layer and its metrics can be exercised with `ScriptedClient` (built
//! only for tests or with the `test-util` feature).

pub mod gemini;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;

use async_trait::async_trait;

use agon_core::error::{AgonError, Result};
use agon_core::protocol::prompt::{Generation, GenerationParams, PromptMessage};

pub use gemini::GeminiClient;
#[cfg(any(test, feature = "test-util"))]
pub use scripted::ScriptedClient;

/// State of the provider credential at the time of the check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialState {
    Present,
    /// Not set (or blank). Carries the variable name.
    Missing(String),
    /// Set but unusable.
    Invalid(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name for logs.
    fn provider(&self) -> &'static str;

    /// Inspect the credential without contacting the provider.
    fn credential_state(&self) -> CredentialState;

    /// Single round trip. No retries.
    async fn generate(
        &self,
        messages: &[PromptMessage],
        params: GenerationParams,
    ) -> Result<Generation>;

    /// `Configuration` error unless the credential is usable.
    fn require_credentials(&self) -> Result<()> {
        match self.credential_state() {
            CredentialState::Present => Ok(()),
            CredentialState::Missing(var) => Err(AgonError::Configuration(format!(
                "{var} environment variable not set"
            ))),
            CredentialState::Invalid(reason) => Err(AgonError::Configuration(reason)),
        }
    }
}
