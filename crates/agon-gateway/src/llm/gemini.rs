//! Google Gemini `generateContent` client.
//!
//! System messages (persona and replayed assistant notes) are sent as
//! `systemInstruction` parts in their original order; user turns become
//! `contents`, with consecutive user turns merged into one multi-part turn.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use agon_core::error::{AgonError, Result};
use agon_core::protocol::prompt::{Generation, GenerationParams, PromptMessage, PromptRole};

use super::{CredentialState, LlmClient};
use crate::config::LlmSection;

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key_env: String,
}

impl GeminiClient {
    pub fn new(cfg: &LlmSection) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AgonError::Internal(format!("http client init failed: {e}")))?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key_env: cfg.api_key_env.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn api_key(&self) -> Result<String> {
        self.require_credentials()?;
        std::env::var(&self.api_key_env)
            .map_err(|e| AgonError::Configuration(format!("{}: {e}", self.api_key_env)))
    }
}

// --------------------
// Wire types
// --------------------
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    candidates_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

fn build_request<'a>(messages: &'a [PromptMessage], params: GenerationParams) -> GenerateRequest<'a> {
    let mut system_parts = Vec::new();
    let mut contents: Vec<Content<'a>> = Vec::new();

    for m in messages {
        match m.role {
            PromptRole::System => system_parts.push(Part { text: &m.content }),
            PromptRole::User => match contents.last_mut() {
                Some(last) => last.parts.push(Part { text: &m.content }),
                None => contents.push(Content {
                    role: Some("user"),
                    parts: vec![Part { text: &m.content }],
                }),
            },
        }
    }

    GenerateRequest {
        system_instruction: if system_parts.is_empty() {
            None
        } else {
            Some(Content { role: None, parts: system_parts })
        },
        contents,
        generation_config: GenerationConfig {
            temperature: params.temperature,
            max_output_tokens: params.max_tokens,
        },
    }
}

fn extract_generation(resp: GenerateResponse) -> Result<Generation> {
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = resp
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked: {r}"))
            .unwrap_or_else(|| "no text in provider response".to_string());
        return Err(AgonError::MalformedResponse(reason));
    }

    Ok(Generation {
        text,
        completion_tokens: resp.usage_metadata.and_then(|u| u.candidates_token_count),
    })
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    fn credential_state(&self) -> CredentialState {
        match std::env::var(&self.api_key_env) {
            Ok(v) if !v.trim().is_empty() => CredentialState::Present,
            Ok(_) | Err(std::env::VarError::NotPresent) => {
                CredentialState::Missing(self.api_key_env.clone())
            }
            Err(std::env::VarError::NotUnicode(_)) => CredentialState::Invalid(format!(
                "{} environment variable is not valid unicode",
                self.api_key_env
            )),
        }
    }

    async fn generate(
        &self,
        messages: &[PromptMessage],
        params: GenerationParams,
    ) -> Result<Generation> {
        let key = self.api_key()?;
        let body = build_request(messages, params);

        tracing::debug!(model = %self.model, turns = body.contents.len(), "gemini generateContent");

        let resp = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgonError::Transport(e.to_string()))?;

        let status = resp.status();
        let raw = resp
            .text()
            .await
            .map_err(|e| AgonError::Transport(e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            return Err(AgonError::Provider(format!("{status}: {detail}")));
        }

        let parsed: GenerateResponse = serde_json::from_str(&raw)
            .map_err(|e| AgonError::MalformedResponse(e.to_string()))?;
        extract_generation(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn system_notes_go_to_instruction_in_order() {
        let msgs = vec![
            PromptMessage::system("persona"),
            PromptMessage::user("q1"),
            PromptMessage::system("Previous Agon response: a1"),
            PromptMessage::user("q2"),
        ];
        let req = build_request(&msgs, GenerationParams { temperature: 0.5, max_tokens: 64 });
        let v = serde_json::to_value(&req).unwrap();

        assert_eq!(
            v["systemInstruction"]["parts"],
            json!([{ "text": "persona" }, { "text": "Previous Agon response: a1" }])
        );
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][0]["parts"], json!([{ "text": "q1" }, { "text": "q2" }]));
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 64);
    }

    #[test]
    fn extracts_text_and_usage() {
        let resp: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hel" }, { "text": "lo" }], "role": "model" } }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 2 }
        }))
        .unwrap();
        let g = extract_generation(resp).unwrap();
        assert_eq!(g.text, "Hello");
        assert_eq!(g.completion_tokens, Some(2));
    }

    #[test]
    fn blocked_prompt_is_malformed() {
        let resp: GenerateResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        let err = extract_generation(resp).unwrap_err();
        assert_eq!(err.kind(), "MalformedResponseError");
        assert!(err.to_string().contains("SAFETY"));
    }
}
