/// Sport categories
///
/// Managed by platform administrators; academies and talents each reference
/// one category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::slug;

const SLUG_CONSTRAINT: &str = "sport_categories_slug_key";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SportCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSportCategory {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSportCategory {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl SportCategory {
    pub async fn create(pool: &PgPool, data: CreateSportCategory) -> Result<Self, sqlx::Error> {
        let base = slug::slugify(&data.name);
        let mut attempt = 0;

        loop {
            let candidate = slug::candidate(&base, attempt);

            let result = sqlx::query_as::<_, SportCategory>(
                "INSERT INTO sport_categories (name, slug, description) VALUES ($1, $2, $3) RETURNING *",
            )
            .bind(&data.name)
            .bind(&candidate)
            .bind(&data.description)
            .fetch_one(pool)
            .await;

            match result {
                Err(e)
                    if is_unique_violation(&e, SLUG_CONSTRAINT)
                        && attempt + 1 < slug::MAX_SLUG_ATTEMPTS =>
                {
                    debug!(slug = %candidate, "Category slug taken, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Active categories in name order
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SportCategory>(
            "SELECT * FROM sport_categories WHERE is_active = TRUE ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SportCategory>(
            "SELECT * FROM sport_categories WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateSportCategory,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SportCategory>(
            r#"
            UPDATE sport_categories
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1 AND is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .fetch_optional(pool)
        .await
    }

    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sport_categories SET is_active = FALSE WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
