/// Email outbox
///
/// Request handlers never call the mail API directly. They insert rows here
/// and the worker delivers them (`pending → sending → sent | failed`).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE outbox_status AS ENUM ('pending', 'sending', 'sent', 'failed');
///
/// CREATE TABLE email_outbox (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     recipient VARCHAR(320) NOT NULL,
///     subject VARCHAR(300) NOT NULL,
///     text_body TEXT NOT NULL,
///     html_body TEXT,
///     status outbox_status NOT NULL DEFAULT 'pending',
///     attempts INTEGER NOT NULL DEFAULT 0,
///     last_error TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     sent_at TIMESTAMPTZ,
///     claimed_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "outbox_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Sending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OutboxEmail {
    pub id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
    pub status: OutboxStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    /// When the current `sending` claim was taken
    pub claimed_at: Option<DateTime<Utc>>,
}

/// Rendered email ready to queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmail {
    pub recipient: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

impl OutboxEmail {
    /// Queues an email for delivery
    pub async fn enqueue(pool: &PgPool, email: &NewEmail) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, OutboxEmail>(
            r#"
            INSERT INTO email_outbox (recipient, subject, text_body, html_body)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&email.recipient)
        .bind(&email.subject)
        .bind(&email.text_body)
        .bind(&email.html_body)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, OutboxEmail>("SELECT * FROM email_outbox WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
