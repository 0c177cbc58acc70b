//! Chat payloads exchanged over `POST /chat`.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Name reported in every envelope and status payload.
pub const BOT_NAME: &str = "Agon";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Author of a history entry.
///
/// Only `user` and `assistant` are accepted. Any other role fails
/// deserialization (HTTP 422); unknown roles are not silently skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior turn replayed from the client, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

/// Inbound chat request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// New user message.
    pub message: String,
    /// Prior turns, oldest first.
    #[serde(default, alias = "history")]
    pub conversation_history: Vec<ConversationMessage>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// Outbound envelope.
///
/// Exactly one of `message` (on success) or `error` (on failure) carries
/// content. Both keys are always serialized; `error` is `null` on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub message: String,
    pub bot_name: String,
    /// RFC 3339 / ISO-8601 UTC timestamp.
    pub timestamp: String,
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            bot_name: BOT_NAME.to_string(),
            timestamp: utc_timestamp(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: String::new(),
            bot_name: BOT_NAME.to_string(),
            timestamp: utc_timestamp(),
            error: Some(error.into()),
        }
    }
}

/// Current UTC time as ISO-8601 with microsecond precision and `Z` suffix.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
