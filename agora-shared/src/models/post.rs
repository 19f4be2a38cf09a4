/// Page posts
///
/// Posts belong to a page and are written by accepted members. Reads come
/// back as [`PostView`], which carries the author's username and the current
/// like/dislike counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Pagination, RequestStatus};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub page_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub media_urls: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post with author and reaction counts
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub post: Post,
    pub author_username: String,
    pub likes: i64,
    pub dislikes: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePost {
    pub content: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePost {
    pub content: Option<String>,
    pub media_urls: Option<Vec<String>>,
}

const VIEW_SELECT: &str = r#"
    SELECT p.*, u.username AS author_username,
           COUNT(r.user_id) FILTER (WHERE r.kind = 'like') AS likes,
           COUNT(r.user_id) FILTER (WHERE r.kind = 'dislike') AS dislikes
    FROM posts p
    JOIN pages pg ON pg.id = p.page_id AND pg.is_active = TRUE
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_reactions r ON r.post_id = p.id
"#;

impl Post {
    pub async fn create(
        pool: &PgPool,
        page_id: Uuid,
        author_id: Uuid,
        data: CreatePost,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (page_id, author_id, content, media_urls)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(page_id)
        .bind(author_id)
        .bind(data.content)
        .bind(data.media_urls)
        .fetch_one(pool)
        .await
    }

    /// Active post on an active page
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.* FROM posts p
            JOIN pages pg ON pg.id = p.page_id
            WHERE p.id = $1 AND p.is_active = TRUE AND pg.is_active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_view(pool: &PgPool, id: Uuid) -> Result<Option<PostView>, sqlx::Error> {
        let sql = format!(
            "{VIEW_SELECT} WHERE p.id = $1 AND p.is_active = TRUE GROUP BY p.id, u.username"
        );

        sqlx::query_as::<_, PostView>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Posts of one page, newest first
    pub async fn list_for_page(
        pool: &PgPool,
        page_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<PostView>, sqlx::Error> {
        let sql = format!(
            "{VIEW_SELECT} WHERE p.page_id = $1 AND p.is_active = TRUE
             GROUP BY p.id, u.username
             ORDER BY p.created_at DESC
             LIMIT $2 OFFSET $3"
        );

        sqlx::query_as::<_, PostView>(&sql)
            .bind(page_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// Posts of every page the user is an accepted member of, newest first
    pub async fn feed(pool: &PgPool, user_id: Uuid, page: Pagination) -> Result<Vec<PostView>, sqlx::Error> {
        let sql = format!(
            "{VIEW_SELECT} WHERE p.is_active = TRUE
               AND p.page_id IN (
                   SELECT page_id FROM page_members WHERE user_id = $1 AND status = $2
               )
             GROUP BY p.id, u.username
             ORDER BY p.created_at DESC
             LIMIT $3 OFFSET $4"
        );

        sqlx::query_as::<_, PostView>(&sql)
            .bind(user_id)
            .bind(RequestStatus::Accepted)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdatePost) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET content = COALESCE($2, content),
                media_urls = COALESCE($3, media_urls),
                updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.content)
        .bind(data.media_urls)
        .fetch_optional(pool)
        .await
    }

    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_view_serializes_flat() {
        let view = PostView {
            post: Post {
                id: Uuid::new_v4(),
                page_id: Uuid::new_v4(),
                author_id: Uuid::new_v4(),
                content: "Training moved to 6pm".to_string(),
                media_urls: vec![],
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            author_username: "coach".to_string(),
            likes: 3,
            dislikes: 1,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["content"], "Training moved to 6pm");
        assert_eq!(json["likes"], 3);
        assert_eq!(json["dislikes"], 1);
        assert!(json.get("post").is_none());
    }

    #[test]
    fn test_create_post_media_default() {
        let data: CreatePost = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert!(data.media_urls.is_empty());
    }
}
