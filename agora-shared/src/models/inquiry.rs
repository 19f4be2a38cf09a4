/// Inquiries: first contact with an academy or talent owner
///
/// A user sends an inquiry about a listing; its owner accepts (which opens a
/// conversation seeded with the inquiry text) or rejects it. A sender can
/// have at most one *pending* inquiry per listing; the partial unique index
/// `inquiries_pending_sender_target_key` enforces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::review::ListingKind;
use super::{Pagination, RequestStatus};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Inquiry {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub target_kind: ListingKind,
    pub target_id: Uuid,
    pub subject: String,
    pub message: String,
    pub status: RequestStatus,
    pub conversation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inquiry with both parties' usernames
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InquiryView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub inquiry: Inquiry,
    pub sender_username: String,
    pub recipient_username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInquiry {
    pub target_kind: ListingKind,
    pub target_id: Uuid,
    pub subject: String,
    pub message: String,
}

/// Which side of the inbox to list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryBox {
    #[default]
    Received,
    Sent,
}

impl Inquiry {
    /// Text posted as the first message when the inquiry is accepted
    pub fn opening_message(&self) -> String {
        format!("{}\n\n{}", self.subject, self.message)
    }

    pub async fn create(
        pool: &PgPool,
        sender_id: Uuid,
        recipient_id: Uuid,
        data: CreateInquiry,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Inquiry>(
            r#"
            INSERT INTO inquiries (sender_id, recipient_id, target_kind, target_id, subject, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(data.target_kind)
        .bind(data.target_id)
        .bind(data.subject)
        .bind(data.message)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Inquiry>("SELECT * FROM inquiries WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Inquiries received or sent by `user_id`, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        inbox: InquiryBox,
        page: Pagination,
    ) -> Result<Vec<InquiryView>, sqlx::Error> {
        let column = match inbox {
            InquiryBox::Received => "recipient_id",
            InquiryBox::Sent => "sender_id",
        };
        let sql = format!(
            r#"
            SELECT i.*, s.username AS sender_username, r.username AS recipient_username
            FROM inquiries i
            JOIN users s ON s.id = i.sender_id
            JOIN users r ON r.id = i.recipient_id
            WHERE i.{column} = $1
            ORDER BY i.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        sqlx::query_as::<_, InquiryView>(&sql)
            .bind(user_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// Moves a pending inquiry to `status`
    ///
    /// Returns `None` if the inquiry is no longer pending.
    pub async fn decide(pool: &PgPool, id: Uuid, status: RequestStatus) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Inquiry>(
            r#"
            UPDATE inquiries SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(RequestStatus::Pending)
        .fetch_optional(pool)
        .await
    }

    /// Links the conversation opened on acceptance
    pub async fn attach_conversation(
        pool: &PgPool,
        id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Inquiry>(
            "UPDATE inquiries SET conversation_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(conversation_id)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inquiry_box_parse() {
        let inbox: InquiryBox = serde_json::from_str("\"sent\"").unwrap();
        assert_eq!(inbox, InquiryBox::Sent);
        assert_eq!(InquiryBox::default(), InquiryBox::Received);
    }

    #[test]
    fn test_opening_message() {
        let inquiry = Inquiry {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            target_kind: ListingKind::Academy,
            target_id: Uuid::new_v4(),
            subject: "Trial session".to_string(),
            message: "Is there space for a 12 year old?".to_string(),
            status: RequestStatus::Pending,
            conversation_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(
            inquiry.opening_message(),
            "Trial session\n\nIs there space for a 12 year old?"
        );
    }
}
