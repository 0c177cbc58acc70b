//! Chat completion service.
//!
//! Turns a `ChatRequest` into a prompt, runs one provider round trip under a
//! deadline, and folds the outcome into a `ChatResponse` envelope.
//!
//! Outcome contract:
//! - configuration failures are returned as `Err` (the HTTP layer answers 500);
//! - every other failure becomes a `success=false` envelope (HTTP 200).

use std::sync::Arc;
use std::time::{Duration, Instant};

use agon_core::error::{AgonError, Result};
use agon_core::protocol::chat::{ChatRequest, ChatResponse, Role};
use agon_core::protocol::prompt::{GenerationParams, PromptMessage};

use crate::llm::LlmClient;
use crate::obs::metrics::GatewayMetrics;

pub const PERSONA_PROMPT: &str = "You are Agon, a helpful and friendly AI assistant. \
You provide clear, accurate, and concise responses to user questions. \
You are knowledgeable across various topics and always maintain a professional yet approachable tone. \
If you don't know something, you admit it honestly.";

pub const PRIOR_RESPONSE_PREFIX: &str = "Previous Agon response: ";

/// Persona first, then history oldest first, then the new message.
///
/// Assistant history is replayed as a system note rather than a model turn,
/// so the provider only ever sees one assistant voice.
pub fn build_messages(req: &ChatRequest) -> Vec<PromptMessage> {
    let mut out = Vec::with_capacity(req.conversation_history.len() + 2);
    out.push(PromptMessage::system(PERSONA_PROMPT));
    for m in &req.conversation_history {
        out.push(match m.role {
            Role::User => PromptMessage::user(m.content.clone()),
            Role::Assistant => PromptMessage::system(format!("{PRIOR_RESPONSE_PREFIX}{}", m.content)),
        });
    }
    out.push(PromptMessage::user(req.message.clone()));
    out
}

pub struct ChatService {
    llm: Arc<dyn LlmClient>,
    metrics: Arc<GatewayMetrics>,
    timeout: Duration,
}

impl ChatService {
    pub fn new(llm: Arc<dyn LlmClient>, metrics: Arc<GatewayMetrics>, timeout: Duration) -> Self {
        Self { llm, metrics, timeout }
    }

    pub async fn handle(&self, req: ChatRequest) -> Result<ChatResponse> {
        let start = Instant::now();

        if let Err(e) = self.llm.require_credentials() {
            tracing::error!(provider = self.llm.provider(), error = %e, "chat rejected: provider not configured");
            self.record_failure(&e);
            return Err(e);
        }

        let messages = build_messages(&req);
        let params = GenerationParams {
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };

        let outcome = match tokio::time::timeout(self.timeout, self.llm.generate(&messages, params)).await {
            Ok(r) => r,
            Err(_) => Err(AgonError::Timeout(self.timeout.as_millis() as u64)),
        };
        let outcome = outcome.and_then(|g| {
            if g.text.trim().is_empty() {
                Err(AgonError::MalformedResponse("empty completion".into()))
            } else {
                Ok(g)
            }
        });

        match outcome {
            Ok(generation) => {
                self.metrics
                    .chat_duration
                    .observe_duration(&[], start.elapsed());
                self.metrics
                    .chat_response_tokens
                    .observe(&[], generation.token_estimate());
                self.metrics.chat_requests.inc(&[("status", "success")]);
                Ok(ChatResponse::success(generation.text))
            }
            Err(e) if e.is_configuration() => {
                tracing::error!(provider = self.llm.provider(), error = %e, "chat rejected: provider not configured");
                self.record_failure(&e);
                Err(e)
            }
            Err(e) => {
                tracing::warn!(provider = self.llm.provider(), kind = e.kind(), error = %e, "chat failed");
                self.record_failure(&e);
                Ok(ChatResponse::failure(format!("An error occurred: {e}")))
            }
        }
    }

    fn record_failure(&self, e: &AgonError) {
        self.metrics.chat_requests.inc(&[("status", "error")]);
        self.metrics.record_error(e.kind());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agon_core::protocol::chat::ConversationMessage;
    use agon_core::protocol::prompt::PromptRole;

    use crate::llm::ScriptedClient;

    fn request(history: Vec<(Role, &str)>, message: &str) -> ChatRequest {
        ChatRequest {
            message: message.into(),
            conversation_history: history
                .into_iter()
                .map(|(role, c)| ConversationMessage { role, content: c.into() })
                .collect(),
            temperature: 0.3,
            max_tokens: 128,
        }
    }

    fn service(llm: Arc<ScriptedClient>) -> (ChatService, Arc<GatewayMetrics>) {
        let metrics = Arc::new(GatewayMetrics::new());
        let svc = ChatService::new(llm, Arc::clone(&metrics), Duration::from_millis(200));
        (svc, metrics)
    }

    #[test]
    fn prompt_order_and_assistant_translation() {
        let req = request(
            vec![(Role::User, "hi"), (Role::Assistant, "X"), (Role::User, "more")],
            "latest",
        );
        let msgs = build_messages(&req);

        assert_eq!(msgs.len(), 5);
        assert_eq!(msgs[0], PromptMessage::system(PERSONA_PROMPT));
        assert_eq!(msgs[1], PromptMessage::user("hi"));
        assert_eq!(msgs[2].role, PromptRole::System);
        assert_eq!(msgs[2].content, "Previous Agon response: X");
        assert_eq!(msgs[3], PromptMessage::user("more"));
        assert_eq!(msgs[4], PromptMessage::user("latest"));
    }

    #[tokio::test]
    async fn success_records_chat_metrics() {
        let llm = Arc::new(ScriptedClient::new());
        llm.push_reply("Hello there");
        let (svc, metrics) = service(Arc::clone(&llm));

        let resp = svc.handle(request(vec![], "Hello")).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.message, "Hello there");
        assert_eq!(metrics.chat_requests.get(&[("status", "success")]), 1);
        assert_eq!(metrics.chat_duration.count(&[]), 1);
        assert_eq!(metrics.chat_response_tokens.count(&[]), 1);

        let calls = llm.calls();
        assert_eq!(calls[0].1.max_tokens, 128);
    }

    #[tokio::test]
    async fn provider_failure_is_soft() {
        let llm = Arc::new(ScriptedClient::new());
        llm.push_error(AgonError::Provider("429 Too Many Requests: quota".into()));
        let (svc, metrics) = service(llm);

        let resp = svc.handle(request(vec![], "Hello")).await.unwrap();
        assert!(!resp.success);
        assert!(resp.message.is_empty());
        assert!(resp.error.unwrap().starts_with("An error occurred: provider error"));
        assert_eq!(metrics.chat_requests.get(&[("status", "error")]), 1);
        assert_eq!(metrics.errors.get(&[("error_type", "ProviderError")]), 1);
        assert_eq!(metrics.chat_duration.count(&[]), 0);
    }

    #[tokio::test]
    async fn empty_completion_is_soft_failure() {
        let llm = Arc::new(ScriptedClient::new());
        llm.push_reply("   ");
        let (svc, metrics) = service(llm);

        let resp = svc.handle(request(vec![], "Hello")).await.unwrap();
        assert!(!resp.success);
        assert_eq!(metrics.errors.get(&[("error_type", "MalformedResponseError")]), 1);
    }

    #[tokio::test]
    async fn missing_credential_is_hard_failure() {
        let llm = Arc::new(ScriptedClient::new());
        llm.set_configured(false);
        let (svc, metrics) = service(Arc::clone(&llm));

        let err = svc.handle(request(vec![], "Hello")).await.unwrap_err();
        assert!(err.is_configuration());
        assert!(llm.calls().is_empty());
        assert_eq!(metrics.chat_requests.get(&[("status", "error")]), 1);
        assert_eq!(metrics.errors.get(&[("error_type", "ConfigurationError")]), 1);
    }

    #[tokio::test]
    async fn slow_provider_hits_deadline() {
        let llm = Arc::new(ScriptedClient::new().with_delay(Duration::from_secs(5)));
        let (svc, metrics) = service(llm);

        let resp = svc.handle(request(vec![], "Hello")).await.unwrap();
        assert!(!resp.success);
        assert!(resp.error.unwrap().contains("200 ms"));
        assert_eq!(metrics.errors.get(&[("error_type", "TimeoutError")]), 1);
    }
}
