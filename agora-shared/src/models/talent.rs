/// Talent (athlete) profiles
///
/// Same lifecycle as academies: owner-managed, soft-deleted, rated through
/// reviews.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::Pagination;
use crate::db::is_unique_violation;
use crate::slug;

const SLUG_CONSTRAINT: &str = "talents_slug_key";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Talent {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category_id: Uuid,
    pub full_name: String,
    pub slug: String,
    pub position: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub bio: Option<String>,
    pub achievements: Vec<String>,
    pub location: Option<String>,
    pub media_urls: Vec<String>,
    pub average_rating: f64,
    pub review_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTalent {
    pub category_id: Uuid,
    pub full_name: String,
    pub position: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub bio: Option<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTalent {
    pub category_id: Option<Uuid>,
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub bio: Option<String>,
    pub achievements: Option<Vec<String>>,
    pub location: Option<String>,
    pub media_urls: Option<Vec<String>>,
}

/// List filters for `GET /v1/sports/talents`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TalentFilter {
    pub category: Option<Uuid>,
    pub position: Option<String>,
    pub q: Option<String>,
}

impl Talent {
    pub async fn create(pool: &PgPool, owner_id: Uuid, data: CreateTalent) -> Result<Self, sqlx::Error> {
        let base = slug::slugify(&data.full_name);
        let mut attempt = 0;

        loop {
            let candidate = slug::candidate(&base, attempt);

            let result = sqlx::query_as::<_, Talent>(
                r#"
                INSERT INTO talents
                    (owner_id, category_id, full_name, slug, position, date_of_birth,
                     bio, achievements, location, media_urls)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING *
                "#,
            )
            .bind(owner_id)
            .bind(data.category_id)
            .bind(&data.full_name)
            .bind(&candidate)
            .bind(&data.position)
            .bind(data.date_of_birth)
            .bind(&data.bio)
            .bind(&data.achievements)
            .bind(&data.location)
            .bind(&data.media_urls)
            .fetch_one(pool)
            .await;

            match result {
                Ok(talent) => {
                    info!(talent_id = %talent.id, slug = %talent.slug, "Talent profile created");
                    return Ok(talent);
                }
                Err(e)
                    if is_unique_violation(&e, SLUG_CONSTRAINT)
                        && attempt + 1 < slug::MAX_SLUG_ATTEMPTS =>
                {
                    debug!(slug = %candidate, "Talent slug taken, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Talent>("SELECT * FROM talents WHERE id = $1 AND is_active = TRUE")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Talent>("SELECT * FROM talents WHERE slug = $1 AND is_active = TRUE")
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &TalentFilter,
        page: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Talent>(
            r#"
            SELECT * FROM talents
            WHERE is_active = TRUE
              AND ($1::uuid IS NULL OR category_id = $1)
              AND ($2::text IS NULL OR position ILIKE $2)
              AND ($3::text IS NULL OR full_name ILIKE $3 OR location ILIKE $3)
            ORDER BY average_rating DESC, review_count DESC, created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.category)
        .bind(super::search_pattern(filter.position.as_deref()))
        .bind(super::search_pattern(filter.q.as_deref()))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateTalent) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Talent>(
            r#"
            UPDATE talents
            SET category_id = COALESCE($2, category_id),
                full_name = COALESCE($3, full_name),
                position = COALESCE($4, position),
                date_of_birth = COALESCE($5, date_of_birth),
                bio = COALESCE($6, bio),
                achievements = COALESCE($7, achievements),
                location = COALESCE($8, location),
                media_urls = COALESCE($9, media_urls),
                updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.category_id)
        .bind(data.full_name)
        .bind(data.position)
        .bind(data.date_of_birth)
        .bind(data.bio)
        .bind(data.achievements)
        .bind(data.location)
        .bind(data.media_urls)
        .fetch_optional(pool)
        .await
    }

    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE talents SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
