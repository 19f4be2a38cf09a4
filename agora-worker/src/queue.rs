/// Outbox queue
///
/// Claims pending emails and records delivery outcomes. A claim moves rows
/// `pending → sending` in one statement using `FOR UPDATE SKIP LOCKED`, so
/// several workers can poll the same table without sending an email twice.
///
/// Each claim stamps `claimed_at`. A row still in `sending` once the lease
/// has run out (the worker died before settling it) is claimed again, so
/// delivery is at least once.
///
/// # Example
///
/// ```no_run
/// use agora_worker::queue::OutboxQueue;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let queue = OutboxQueue::new(pool, 20, 300);
///
/// for email in queue.claim_batch().await? {
///     // send...
///     queue.mark_sent(email.id).await?;
/// }
/// # Ok(())
/// # }
/// ```

use agora_shared::models::outbox::{OutboxEmail, OutboxStatus};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Longest error text stored on a failed row
const MAX_ERROR_LEN: usize = 2000;

#[derive(Debug, Error)]
pub enum OutboxError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The row was not in `sending` (never claimed, or settled already)
    #[error("Email {0} is not being sent")]
    NotSending(Uuid),
}

pub struct OutboxQueue {
    db: PgPool,
    batch_size: i64,
    lease_secs: u64,
}

impl OutboxQueue {
    pub fn new(db: PgPool, batch_size: i64, lease_secs: u64) -> Self {
        OutboxQueue {
            db,
            batch_size,
            lease_secs,
        }
    }

    /// Claims up to `batch_size` emails, oldest first
    ///
    /// Takes pending rows and `sending` rows whose claim is older than the
    /// lease. Claimed rows come back with status `sending`, a fresh
    /// `claimed_at` and `attempts` already incremented.
    pub async fn claim_batch(&self) -> Result<Vec<OutboxEmail>, OutboxError> {
        let emails = sqlx::query_as::<_, OutboxEmail>(
            r#"
            WITH claimable AS (
                SELECT id
                FROM email_outbox
                WHERE status = $1
                   OR (status = $3
                       AND COALESCE(claimed_at, created_at) < NOW() - make_interval(secs => $4))
                ORDER BY created_at ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE email_outbox
            SET
                status = $3,
                claimed_at = NOW(),
                attempts = email_outbox.attempts + 1
            FROM claimable
            WHERE email_outbox.id = claimable.id
            RETURNING email_outbox.*
            "#,
        )
        .bind(OutboxStatus::Pending)
        .bind(self.batch_size)
        .bind(OutboxStatus::Sending)
        .bind(self.lease_secs as f64)
        .fetch_all(&self.db)
        .await?;

        if !emails.is_empty() {
            let reclaimed = emails.iter().filter(|e| e.attempts > 1).count();
            if reclaimed > 0 {
                tracing::warn!(count = reclaimed, "Reclaimed emails with expired claims");
            }
            tracing::info!(count = emails.len(), "Claimed outbox emails");
        }

        Ok(emails)
    }

    pub async fn mark_sent(&self, id: Uuid) -> Result<(), OutboxError> {
        let result = sqlx::query(
            r#"
            UPDATE email_outbox
            SET status = $2, sent_at = NOW(), last_error = NULL
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(id)
        .bind(OutboxStatus::Sent)
        .bind(OutboxStatus::Sending)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OutboxError::NotSending(id));
        }

        tracing::debug!(email_id = %id, "Email marked sent");
        Ok(())
    }

    pub async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), OutboxError> {
        let result = sqlx::query(
            r#"
            UPDATE email_outbox
            SET status = $2, last_error = $3
            WHERE id = $1 AND status = $4
            "#,
        )
        .bind(id)
        .bind(OutboxStatus::Failed)
        .bind(truncate_error(error))
        .bind(OutboxStatus::Sending)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OutboxError::NotSending(id));
        }

        tracing::debug!(email_id = %id, "Email marked failed");
        Ok(())
    }

    /// Number of emails waiting to be claimed
    pub async fn pending_count(&self) -> Result<i64, OutboxError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM email_outbox WHERE status = $1")
                .bind(OutboxStatus::Pending)
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }
}

fn truncate_error(error: &str) -> &str {
    match error.char_indices().nth(MAX_ERROR_LEN) {
        Some((end, _)) => &error[..end],
        None => error,
    }
}
