//! Operational HTTP endpoints.
//!
//! - `/`        : liveness banner
//! - `/health`  : provider credential status
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use agon_core::protocol::chat::BOT_NAME;

use crate::app_state::AppState;
use crate::llm::CredentialState;

pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "online",
        "bot_name": BOT_NAME,
        "message": "Agon AI Chatbot is running!"
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = match state.llm().credential_state() {
        CredentialState::Present => json!({
            "status": "healthy",
            "api_configured": true,
            "bot_name": BOT_NAME
        }),
        CredentialState::Missing(_) => json!({
            "status": "healthy",
            "api_configured": false,
            "bot_name": BOT_NAME
        }),
        CredentialState::Invalid(reason) => json!({
            "status": "unhealthy",
            "api_configured": false,
            "bot_name": BOT_NAME,
            "error": reason
        }),
    };
    Json(body)
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}
