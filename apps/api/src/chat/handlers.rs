use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chat::prompts::CHAT_SYSTEM;
use crate::chat::{build_chat_prompt, clean_response, ChatMessage, UserInfo, FALLBACK_RESPONSE};
use crate::errors::AppError;
use crate::llm_client::ResponseFormat;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub context: Vec<ChatMessage>,
    pub user_info: Option<UserInfo>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /api/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = payload?;
    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Message is required".to_string()))?;

    let Some(llm) = &state.llm else {
        warn!("chat requested without a configured API key");
        return Ok(Json(ChatResponse {
            response: FALLBACK_RESPONSE.to_string(),
        }));
    };

    let prompt = build_chat_prompt(&message, &req.context, req.user_info.as_ref());
    let response = match llm.call_text(&prompt, CHAT_SYSTEM, ResponseFormat::Text).await {
        Ok(text) => clean_response(&text),
        Err(e) if e.is_rate_limited() => return Err(AppError::RateLimited),
        Err(e) => {
            warn!("chat response failed: {e}");
            FALLBACK_RESPONSE.to_string()
        }
    };

    Ok(Json(ChatResponse { response }))
}
