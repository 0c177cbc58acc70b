//! In-process client with queued replies.
//!
//! Replies are served FIFO; once the queue is empty the client echoes the last
//! user turn. Every prompt it receives is recorded for inspection.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use agon_core::error::{AgonError, Result};
use agon_core::protocol::prompt::{Generation, GenerationParams, PromptMessage, PromptRole};

use super::{CredentialState, LlmClient};

const SCRIPTED_KEY_ENV: &str = "SCRIPTED_API_KEY";

#[derive(Default)]
pub struct ScriptedClient {
    unconfigured: AtomicBool,
    delay: Option<Duration>,
    replies: Mutex<VecDeque<Result<Generation>>>,
    calls: Mutex<Vec<(Vec<PromptMessage>, GenerationParams)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every call for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Toggle the simulated credential.
    pub fn set_configured(&self, configured: bool) {
        self.unconfigured.store(!configured, Ordering::Relaxed);
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        self.push(Ok(Generation { text: text.into(), completion_tokens: None }));
    }

    pub fn push_error(&self, err: AgonError) {
        self.push(Err(err));
    }

    fn push(&self, r: Result<Generation>) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(r);
        }
    }

    /// Prompts received so far, oldest first.
    pub fn calls(&self) -> Vec<(Vec<PromptMessage>, GenerationParams)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn provider(&self) -> &'static str {
        "scripted"
    }

    fn credential_state(&self) -> CredentialState {
        if self.unconfigured.load(Ordering::Relaxed) {
            CredentialState::Missing(SCRIPTED_KEY_ENV.to_string())
        } else {
            CredentialState::Present
        }
    }

    async fn generate(
        &self,
        messages: &[PromptMessage],
        params: GenerationParams,
    ) -> Result<Generation> {
        if let Ok(mut c) = self.calls.lock() {
            c.push((messages.to_vec(), params));
        }
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }

        let queued = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        match queued {
            Some(r) => r,
            None => {
                let last = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == PromptRole::User)
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                Ok(Generation { text: format!("echo: {last}"), completion_tokens: None })
            }
        }
    }
}
