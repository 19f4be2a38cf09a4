/// Conversations and messages
///
/// A conversation joins exactly two users. Participants are stored ordered
/// (`participant_a < participant_b`) so the unique pair constraint also
/// covers the swapped pair, which makes [`Conversation::find_or_create`] a
/// single upsert.
///
/// # Example
///
/// ```no_run
/// use agora_shared::models::conversation::{Conversation, Message};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, me: Uuid, them: Uuid) -> Result<(), sqlx::Error> {
/// let conversation = Conversation::find_or_create(&pool, me, them, None).await?;
/// Message::create(&pool, conversation.id, me, "Are trials open this month?").await?;
///
/// // Same conversation from the other side
/// let again = Conversation::find_or_create(&pool, them, me, None).await?;
/// assert_eq!(again.id, conversation.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::Pagination;

/// Orders two user ids the way they are stored
pub fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub inquiry_id: Option<Uuid>,
    pub participant_a: Uuid,
    pub participant_b: Uuid,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Row of the conversation list: the other participant, last message preview
/// and unread count for the viewer
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub other_user_id: Uuid,
    pub other_username: String,
    pub other_name: Option<String>,
    pub other_avatar_url: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }

    /// The participant that is not `user_id`
    pub fn other_participant(&self, user_id: Uuid) -> Uuid {
        if self.participant_a == user_id {
            self.participant_b
        } else {
            self.participant_a
        }
    }

    /// Returns the conversation between two users, creating it if needed
    ///
    /// An `inquiry_id` is recorded only if the conversation has none yet.
    /// Callers must reject `a == b` beforehand; the ordered-pair check
    /// constraint refuses it.
    pub async fn find_or_create(
        pool: &PgPool,
        a: Uuid,
        b: Uuid,
        inquiry_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        let (first, second) = ordered_pair(a, b);

        sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (participant_a, participant_b, inquiry_id)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT conversations_pair_key DO UPDATE
                SET inquiry_id = COALESCE(conversations.inquiry_id, EXCLUDED.inquiry_id)
            RETURNING *
            "#,
        )
        .bind(first)
        .bind(second)
        .bind(inquiry_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Conversations of `user_id`, most recently active first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<ConversationSummary>, sqlx::Error> {
        sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT
                c.id,
                u.id AS other_user_id,
                u.username AS other_username,
                u.name AS other_name,
                u.avatar_url AS other_avatar_url,
                last.body AS last_message,
                c.last_message_at,
                (
                    SELECT COUNT(*) FROM messages m
                    WHERE m.conversation_id = c.id AND m.sender_id <> $1 AND m.read_at IS NULL
                ) AS unread_count
            FROM conversations c
            JOIN users u
              ON u.id = CASE WHEN c.participant_a = $1 THEN c.participant_b ELSE c.participant_a END
            LEFT JOIN LATERAL (
                SELECT body FROM messages
                WHERE conversation_id = c.id
                ORDER BY created_at DESC
                LIMIT 1
            ) last ON TRUE
            WHERE c.participant_a = $1 OR c.participant_b = $1
            ORDER BY COALESCE(c.last_message_at, c.created_at) DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    /// Messages sent to `user_id` that are still unread, across all conversations
    pub async fn unread_total(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM messages m
            JOIN conversations c ON c.id = m.conversation_id
            WHERE (c.participant_a = $1 OR c.participant_b = $1)
              AND m.sender_id <> $1
              AND m.read_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}

impl Message {
    /// Appends a message and bumps the conversation's `last_message_at`
    pub async fn create(
        pool: &PgPool,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            WITH inserted AS (
                INSERT INTO messages (conversation_id, sender_id, body)
                VALUES ($1, $2, $3)
                RETURNING *
            ), touched AS (
                UPDATE conversations
                SET last_message_at = (SELECT created_at FROM inserted)
                WHERE id = $1
            )
            SELECT * FROM inserted
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(body)
        .fetch_one(pool)
        .await
    }

    /// Messages of a conversation in chronological order
    pub async fn list(
        pool: &PgPool,
        conversation_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(conversation_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    /// Marks the given messages read for `reader_id`; returns how many changed
    ///
    /// Only messages in `message_ids` that the other party sent are touched,
    /// so a page of history marks just what it showed.
    pub async fn mark_read(
        pool: &PgPool,
        conversation_id: Uuid,
        reader_id: Uuid,
        message_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        if message_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE messages SET read_at = NOW()
            WHERE conversation_id = $1 AND sender_id <> $2 AND read_at IS NULL
              AND id = ANY($3)
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .bind(message_ids)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_pair_is_symmetric() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(ordered_pair(a, b), ordered_pair(b, a));

        let (first, second) = ordered_pair(a, b);
        assert!(first <= second);
    }

    #[test]
    fn test_participants() {
        let (a, b) = ordered_pair(Uuid::new_v4(), Uuid::new_v4());
        let conversation = Conversation {
            id: Uuid::new_v4(),
            inquiry_id: None,
            participant_a: a,
            participant_b: b,
            last_message_at: None,
            created_at: Utc::now(),
        };

        assert!(conversation.is_participant(a));
        assert!(conversation.is_participant(b));
        assert!(!conversation.is_participant(Uuid::new_v4()));
        assert_eq!(conversation.other_participant(a), b);
        assert_eq!(conversation.other_participant(b), a);
    }
}
