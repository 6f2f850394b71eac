// src/api/chatbot.rs

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppState;
use crate::error::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatbotRequest {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatbotReply {
    pub success: bool,
    pub response: String,
}

#[utoipa::path(
    post,
    path = "/chatbot/api/chat/",
    tag = "support",
    request_body = ChatbotRequest,
    responses(
        (status = 200, description = "AI answer, or the scripted one when the AI is unavailable", body = ChatbotReply),
        (status = 400, description = "Empty message")
    )
)]
#[post("/chatbot/api/chat/")]
pub async fn chat(
    state: web::Data<AppState>,
    body: web::Json<ChatbotRequest>,
) -> Result<HttpResponse, AppError> {
    let message = body.message.trim();
    if message.is_empty() {
        return Err(AppError::EmptyMessage);
    }

    let response = state.support.respond(message).await;

    Ok(HttpResponse::Ok().json(ChatbotReply {
        success: true,
        response,
    }))
}
