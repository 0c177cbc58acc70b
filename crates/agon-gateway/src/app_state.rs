//! Shared application state for the Agon gateway.
//!
//! Holds the config, the metrics registry, the LLM client and the chat service.
//! Everything is built once at startup and shared behind `Arc`s; the registry is
//! the only mutable part.

use std::sync::Arc;
use std::time::Duration;

use agon_core::error::Result;

use crate::config::GatewayConfig;
use crate::llm::{GeminiClient, LlmClient};
use crate::obs::metrics::GatewayMetrics;
use crate::services::ChatService;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    metrics: Arc<GatewayMetrics>,
    llm: Arc<dyn LlmClient>,
    chat: Arc<ChatService>,
}

struct AppStateInner {
    cfg: GatewayConfig,
}

impl AppState {
    /// Build application state with the Gemini client from `cfg.llm`.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let llm = Arc::new(GeminiClient::new(&cfg.llm)?);
        Ok(Self::with_client(cfg, llm))
    }

    /// Build application state around an arbitrary client.
    pub fn with_client(cfg: GatewayConfig, llm: Arc<dyn LlmClient>) -> Self {
        let metrics = Arc::new(GatewayMetrics::new());
        let chat = ChatService::new(
            Arc::clone(&llm),
            Arc::clone(&metrics),
            Duration::from_millis(cfg.llm.timeout_ms),
        );

        tracing::info!(provider = llm.provider(), model = %cfg.llm.model, "app state ready");

        Self {
            inner: Arc::new(AppStateInner { cfg }),
            metrics,
            llm,
            chat: Arc::new(chat),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn llm(&self) -> Arc<dyn LlmClient> {
        Arc::clone(&self.llm)
    }

    pub fn chat(&self) -> Arc<ChatService> {
        Arc::clone(&self.chat)
    }
}
