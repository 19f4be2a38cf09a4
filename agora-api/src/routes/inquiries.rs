/// Inquiry endpoints
///
/// # Endpoints
///
/// - `POST /v1/inquiries` - Contact the owner of an academy or talent (auth)
/// - `GET /v1/inquiries?box=received|sent` - Own inquiries (auth)
/// - `POST /v1/inquiries/:id/accept` - Accept and open a conversation (recipient)
/// - `POST /v1/inquiries/:id/reject` - Decline (recipient)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{display_name, load_user, notification_recipient, Listing},
};
use agora_shared::auth::{authorization::require_ownership, middleware::AuthContext};
use agora_shared::models::conversation::{Conversation, Message};
use agora_shared::models::inquiry::{CreateInquiry, Inquiry, InquiryBox, InquiryView};
use agora_shared::models::review::ListingKind;
use agora_shared::models::{Pagination, RequestStatus};
use agora_shared::notifications::Notification;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInquiryRequest {
    pub target_kind: ListingKind,

    pub target_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Subject must be 1-200 characters"))]
    pub subject: String,

    #[validate(length(min = 1, max = 5000, message = "Message must be 1-5000 characters"))]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct InquiryQuery {
    #[serde(default, rename = "box")]
    pub inbox: InquiryBox,
}

/// Subject and message must have content once trimmed
fn check_not_blank(req: &CreateInquiryRequest) -> ApiResult<()> {
    if req.subject.trim().is_empty() {
        return Err(ApiError::invalid("subject", "Subject must not be blank"));
    }
    if req.message.trim().is_empty() {
        return Err(ApiError::invalid("message", "Message must not be blank"));
    }
    Ok(())
}

/// Sends an inquiry to a listing owner
///
/// # Errors
///
/// - `400 Bad Request`: Inquiry about your own listing
/// - `404 Not Found`: Listing does not exist
/// - `409 Conflict`: A pending inquiry for this listing already exists
pub async fn create_inquiry(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateInquiryRequest>,
) -> ApiResult<(StatusCode, Json<Inquiry>)> {
    req.validate()?;
    check_not_blank(&req)?;

    let listing = req
        .target_kind
        .find_owner(&state.db, req.target_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Listing not found".to_string()))?;

    if listing.owner_id == auth.user_id {
        return Err(ApiError::BadRequest(
            "You cannot send an inquiry about your own listing".to_string(),
        ));
    }

    let sender = load_user(&state.db, auth.user_id).await?;
    let owner = load_user(&state.db, listing.owner_id).await?;

    let inquiry = Inquiry::create(
        &state.db,
        auth.user_id,
        listing.owner_id,
        CreateInquiry {
            target_kind: req.target_kind,
            target_id: req.target_id,
            subject: req.subject.trim().to_string(),
            message: req.message.trim().to_string(),
        },
    )
    .await?;

    tracing::info!(
        inquiry_id = %inquiry.id,
        sender_id = %auth.user_id,
        target = req.target_kind.as_str(),
        target_id = %req.target_id,
        "Inquiry sent"
    );

    state
        .notifier
        .notify(Notification::InquiryReceived {
            to: owner.email,
            sender_name: display_name(&sender),
            listing_name: listing.name,
            subject: inquiry.subject.clone(),
        })
        .await;

    Ok((StatusCode::CREATED, Json(inquiry)))
}

pub async fn list_inquiries(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<InquiryQuery>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Listing<InquiryView>>> {
    let inquiries = Inquiry::list_for_user(&state.db, auth.user_id, query.inbox, page).await?;
    Ok(Listing::new(inquiries, page))
}

/// Pending inquiry addressed to the caller
async fn pending_for_recipient(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Inquiry> {
    let inquiry = Inquiry::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Inquiry not found".to_string()))?;

    require_ownership(auth, inquiry.recipient_id)?;

    if inquiry.status != RequestStatus::Pending {
        return Err(ApiError::Conflict(format!(
            "Inquiry is already {}",
            inquiry.status.as_str()
        )));
    }

    Ok(inquiry)
}

/// Listing name for emails; falls back to the inquiry subject
async fn listing_name(state: &AppState, inquiry: &Inquiry) -> String {
    match inquiry.target_kind.find_owner(&state.db, inquiry.target_id).await {
        Ok(Some(listing)) => listing.name,
        Ok(None) => inquiry.subject.clone(),
        Err(e) => {
            tracing::warn!(inquiry_id = %inquiry.id, error = %e, "Listing lookup failed");
            inquiry.subject.clone()
        }
    }
}

/// Accepts an inquiry
///
/// Opens (or reuses) the conversation between both parties, posts the
/// inquiry text as its first message and emails the sender.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the recipient
/// - `409 Conflict`: Inquiry is no longer pending
pub async fn accept_inquiry(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(inquiry_id): Path<Uuid>,
) -> ApiResult<Json<Inquiry>> {
    pending_for_recipient(&state, &auth, inquiry_id).await?;

    let inquiry = Inquiry::decide(&state.db, inquiry_id, RequestStatus::Accepted)
        .await?
        .ok_or_else(|| ApiError::Conflict("Inquiry is no longer pending".to_string()))?;

    let conversation = Conversation::find_or_create(
        &state.db,
        inquiry.sender_id,
        inquiry.recipient_id,
        Some(inquiry.id),
    )
    .await?;

    Message::create(
        &state.db,
        conversation.id,
        inquiry.sender_id,
        &inquiry.opening_message(),
    )
    .await?;

    let inquiry = Inquiry::attach_conversation(&state.db, inquiry.id, conversation.id).await?;

    tracing::info!(
        inquiry_id = %inquiry.id,
        conversation_id = %conversation.id,
        recipient_id = %auth.user_id,
        "Inquiry accepted"
    );

    if let Some(sender) = notification_recipient(&state.db, inquiry.sender_id).await {
        state
            .notifier
            .notify(Notification::InquiryAccepted {
                to: sender.email,
                listing_name: listing_name(&state, &inquiry).await,
                conversation_id: conversation.id,
            })
            .await;
    }

    Ok(Json(inquiry))
}

pub async fn reject_inquiry(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(inquiry_id): Path<Uuid>,
) -> ApiResult<Json<Inquiry>> {
    pending_for_recipient(&state, &auth, inquiry_id).await?;

    let inquiry = Inquiry::decide(&state.db, inquiry_id, RequestStatus::Rejected)
        .await?
        .ok_or_else(|| ApiError::Conflict("Inquiry is no longer pending".to_string()))?;

    tracing::info!(inquiry_id = %inquiry.id, recipient_id = %auth.user_id, "Inquiry rejected");

    if let Some(sender) = notification_recipient(&state.db, inquiry.sender_id).await {
        state
            .notifier
            .notify(Notification::InquiryRejected {
                to: sender.email,
                listing_name: listing_name(&state, &inquiry).await,
            })
            .await;
    }

    Ok(Json(inquiry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inquiry_query_box() {
        let query: InquiryQuery = serde_json::from_value(serde_json::json!({ "box": "sent" })).unwrap();
        assert_eq!(query.inbox, InquiryBox::Sent);

        let query: InquiryQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(query.inbox, InquiryBox::Received);
    }

    #[test]
    fn test_create_request_validation() {
        let req = CreateInquiryRequest {
            target_kind: ListingKind::Talent,
            target_id: Uuid::new_v4(),
            subject: String::new(),
            message: "Hello".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_blank_subject_rejected() {
        let req = CreateInquiryRequest {
            target_kind: ListingKind::Academy,
            target_id: Uuid::new_v4(),
            subject: "   ".to_string(),
            message: "Do you take under-12 players?".to_string(),
        };
        assert!(req.validate().is_ok());

        match check_not_blank(&req) {
            Err(ApiError::ValidationError(details)) => assert_eq!(details[0].field, "subject"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_message_rejected() {
        let req = CreateInquiryRequest {
            target_kind: ListingKind::Talent,
            target_id: Uuid::new_v4(),
            subject: "Trial".to_string(),
            message: "\n\t ".to_string(),
        };
        assert!(check_not_blank(&req).is_err());

        let req = CreateInquiryRequest {
            message: "Trial next week?".to_string(),
            ..req
        };
        assert!(check_not_blank(&req).is_ok());
    }
}
