/// Conversation and message endpoints
///
/// - `GET /v1/conversations` - Own conversations with last message and unread count
/// - `POST /v1/conversations` - Find or create a direct conversation
/// - `GET /v1/conversations/unread` - Total unread messages
/// - `GET /v1/conversations/:id/messages` - Messages, marking received ones read
/// - `POST /v1/conversations/:id/messages` - Send a message

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{load_user, Listing},
};
use agora_shared::auth::middleware::AuthContext;
use agora_shared::models::conversation::{Conversation, ConversationSummary, Message};
use agora_shared::models::Pagination;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct StartConversationRequest {
    pub recipient_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 5000, message = "Message must be 1-5000 characters"))]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    pub count: i64,
}

pub async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Listing<ConversationSummary>>> {
    let conversations = Conversation::list_for_user(&state.db, auth.user_id, page).await?;
    Ok(Listing::new(conversations, page))
}

pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<UnreadResponse>> {
    let count = Conversation::unread_total(&state.db, auth.user_id).await?;
    Ok(Json(UnreadResponse { count }))
}

/// Opens a direct conversation, or returns the existing one
///
/// # Errors
///
/// - `400 Bad Request`: Recipient is the caller
/// - `404 Not Found`: Recipient does not exist or is deactivated
pub async fn start_conversation(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<StartConversationRequest>,
) -> ApiResult<Json<Conversation>> {
    if req.recipient_id == auth.user_id {
        return Err(ApiError::BadRequest(
            "You cannot start a conversation with yourself".to_string(),
        ));
    }

    load_user(&state.db, req.recipient_id).await?;

    let conversation =
        Conversation::find_or_create(&state.db, auth.user_id, req.recipient_id, None).await?;

    Ok(Json(conversation))
}

async fn participant_conversation(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
) -> ApiResult<Conversation> {
    let conversation = Conversation::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?;

    if !conversation.is_participant(auth.user_id) {
        return Err(ApiError::Forbidden(
            "You are not a participant in this conversation".to_string(),
        ));
    }

    Ok(conversation)
}

pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(conversation_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Listing<Message>>> {
    participant_conversation(&state, &auth, conversation_id).await?;

    let messages = Message::list(&state.db, conversation_id, page).await?;
    let shown: Vec<Uuid> = messages.iter().map(|m| m.id).collect();
    let marked = Message::mark_read(&state.db, conversation_id, auth.user_id, &shown).await?;

    if marked > 0 {
        tracing::debug!(
            user_id = %auth.user_id,
            conversation_id = %conversation_id,
            marked,
            "Messages marked read"
        );
    }

    Ok(Listing::new(messages, page))
}

pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(conversation_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    req.validate()?;
    if req.body.trim().is_empty() {
        return Err(ApiError::invalid("body", "Message must not be blank"));
    }

    participant_conversation(&state, &auth, conversation_id).await?;

    let message = Message::create(&state.db, conversation_id, auth.user_id, &req.body).await?;

    Ok((StatusCode::CREATED, Json(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_length() {
        assert!(SendMessageRequest { body: "hi".to_string() }.validate().is_ok());
        assert!(SendMessageRequest { body: String::new() }.validate().is_err());
        assert!(SendMessageRequest { body: "x".repeat(5001) }.validate().is_err());
    }
}
