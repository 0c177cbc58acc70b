//! `POST /chat`.

use axum::{extract::State, Json};

use agon_core::protocol::chat::{ChatRequest, ChatResponse};

use super::{ApiError, AppJson};
use crate::app_state::AppState;

pub async fn chat(
    State(app): State<AppState>,
    AppJson(req): AppJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let resp = app.chat().handle(req).await?;
    Ok(Json(resp))
}
