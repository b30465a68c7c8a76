//! Chat assistant handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, CurrentUser, Envelope};
use spendwise_core::ai::ChatReply;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Continue an existing conversation
    pub conversation_id: Option<String>,
}

/// POST /api/chat/message - Send a message to the assistant
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<Envelope<ChatReply>>, AppError> {
    if body.message.trim().is_empty() {
        return Err(AppError::bad_request("Message is required"));
    }
    let assistant = state
        .assistant
        .as_ref()
        .ok_or_else(|| AppError::unavailable("AI assistant is not configured"))?;

    let reply = assistant
        .chat(&user, body.conversation_id.as_deref(), &body.message)
        .await
        .map_err(AppError::from_ai)?;
    Ok(Envelope::ok(reply))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearRequest {
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
pub struct ClearResult {
    pub cleared: bool,
    pub message: &'static str,
}

/// POST /api/chat/clear - Forget a conversation
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<ClearRequest>,
) -> Result<Json<Envelope<ClearResult>>, AppError> {
    let cleared = match (&state.assistant, body.conversation_id.as_deref()) {
        (Some(assistant), Some(id)) => assistant.clear_conversation(&user, id),
        _ => false,
    };
    Ok(Envelope::ok(ClearResult {
        cleared,
        message: "Conversation history cleared",
    }))
}
