/// Like/dislike votes on posts
///
/// A user holds at most one reaction per post, enforced by the
/// `post_reactions_post_user_key` unique constraint. Posting a reaction
/// toggles it:
///
/// | current  | requested | outcome                     |
/// |----------|-----------|-----------------------------|
/// | none     | like      | `added` (like)              |
/// | like     | like      | `removed`                   |
/// | like     | dislike   | `switched` (now dislike)    |
///
/// Concurrent double clicks race on the unique index; the losing insert is a
/// no-op and the state is re-read.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reaction_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

const MAX_TOGGLE_ATTEMPTS: u32 = 3;

/// What a toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionOutcome {
    Added,
    Removed,
    Switched,
}

/// Decides the toggle transition from the user's current reaction
pub fn decide(current: Option<ReactionKind>, requested: ReactionKind) -> ReactionOutcome {
    match current {
        None => ReactionOutcome::Added,
        Some(kind) if kind == requested => ReactionOutcome::Removed,
        Some(_) => ReactionOutcome::Switched,
    }
}

/// Reaction totals for a post plus the caller's own reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReactionCounts {
    pub likes: i64,
    pub dislikes: i64,
    pub my_reaction: Option<ReactionKind>,
}

/// Result of [`toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleResult {
    pub outcome: ReactionOutcome,
    #[serde(flatten)]
    pub counts: ReactionCounts,
}

async fn current_reaction(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<Option<ReactionKind>, sqlx::Error> {
    sqlx::query_scalar::<_, ReactionKind>(
        "SELECT kind FROM post_reactions WHERE post_id = $1 AND user_id = $2",
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Applies the toggle for `user_id` on `post_id` and returns fresh counts
pub async fn toggle(
    pool: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
    requested: ReactionKind,
) -> Result<ToggleResult, sqlx::Error> {
    let mut current = current_reaction(pool, post_id, user_id).await?;
    let mut attempts = 0;

    let outcome = loop {
        attempts += 1;
        let outcome = decide(current, requested);

        let applied = match outcome {
            ReactionOutcome::Added => sqlx::query(
                r#"
                INSERT INTO post_reactions (post_id, user_id, kind)
                VALUES ($1, $2, $3)
                ON CONFLICT ON CONSTRAINT post_reactions_post_user_key DO NOTHING
                "#,
            )
            .bind(post_id)
            .bind(user_id)
            .bind(requested)
            .execute(pool)
            .await?
            .rows_affected(),
            ReactionOutcome::Removed => sqlx::query(
                "DELETE FROM post_reactions WHERE post_id = $1 AND user_id = $2 AND kind = $3",
            )
            .bind(post_id)
            .bind(user_id)
            .bind(requested)
            .execute(pool)
            .await?
            .rows_affected(),
            ReactionOutcome::Switched => sqlx::query(
                "UPDATE post_reactions SET kind = $3, created_at = NOW() WHERE post_id = $1 AND user_id = $2",
            )
            .bind(post_id)
            .bind(user_id)
            .bind(requested)
            .execute(pool)
            .await?
            .rows_affected(),
        };

        if applied > 0 {
            break outcome;
        }

        // Another request changed the row between read and write
        let latest = current_reaction(pool, post_id, user_id).await?;
        if latest == current || attempts >= MAX_TOGGLE_ATTEMPTS {
            break outcome;
        }
        debug!(%post_id, %user_id, "Reaction changed concurrently, re-deciding");
        current = latest;
    };

    let counts = counts(pool, post_id, Some(user_id)).await?;
    Ok(ToggleResult { outcome, counts })
}

/// Like/dislike totals, with `viewer`'s own reaction when given
pub async fn counts(pool: &PgPool, post_id: Uuid, viewer: Option<Uuid>) -> Result<ReactionCounts, sqlx::Error> {
    sqlx::query_as::<_, ReactionCounts>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE kind = 'like') AS likes,
            COUNT(*) FILTER (WHERE kind = 'dislike') AS dislikes,
            (SELECT kind FROM post_reactions WHERE post_id = $1 AND user_id = $2) AS my_reaction
        FROM post_reactions
        WHERE post_id = $1
        "#,
    )
    .bind(post_id)
    .bind(viewer)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_add() {
        assert_eq!(decide(None, ReactionKind::Like), ReactionOutcome::Added);
        assert_eq!(decide(None, ReactionKind::Dislike), ReactionOutcome::Added);
    }

    #[test]
    fn test_decide_remove_same_kind() {
        assert_eq!(decide(Some(ReactionKind::Like), ReactionKind::Like), ReactionOutcome::Removed);
        assert_eq!(
            decide(Some(ReactionKind::Dislike), ReactionKind::Dislike),
            ReactionOutcome::Removed
        );
    }

    #[test]
    fn test_decide_switch() {
        assert_eq!(
            decide(Some(ReactionKind::Like), ReactionKind::Dislike),
            ReactionOutcome::Switched
        );
        assert_eq!(
            decide(Some(ReactionKind::Dislike), ReactionKind::Like),
            ReactionOutcome::Switched
        );
    }

    #[test]
    fn test_toggle_result_json() {
        let result = ToggleResult {
            outcome: ReactionOutcome::Switched,
            counts: ReactionCounts {
                likes: 0,
                dislikes: 2,
                my_reaction: Some(ReactionKind::Dislike),
            },
        };

        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["outcome"], "switched");
        assert_eq!(json["dislikes"], 2);
        assert_eq!(json["my_reaction"], "dislike");
    }
}
