/// Sports academy listings
///
/// Owned by the user who created them. `average_rating` and `review_count`
/// are denormalised from `reviews` and maintained by
/// [`review::recompute_rating`](super::review::recompute_rating).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::Pagination;
use crate::db::is_unique_violation;
use crate::slug;

const SLUG_CONSTRAINT: &str = "academies_slug_key";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Academy {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub logo_url: Option<String>,
    pub average_rating: f64,
    pub review_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAcademy {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAcademy {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub logo_url: Option<String>,
}

/// List filters for `GET /v1/sports/academies`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcademyFilter {
    pub category: Option<Uuid>,
    pub q: Option<String>,
}

impl Academy {
    pub async fn create(pool: &PgPool, owner_id: Uuid, data: CreateAcademy) -> Result<Self, sqlx::Error> {
        let base = slug::slugify(&data.name);
        let mut attempt = 0;

        loop {
            let candidate = slug::candidate(&base, attempt);

            let result = sqlx::query_as::<_, Academy>(
                r#"
                INSERT INTO academies
                    (owner_id, category_id, name, slug, description, location, contact_email, phone, logo_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
                "#,
            )
            .bind(owner_id)
            .bind(data.category_id)
            .bind(&data.name)
            .bind(&candidate)
            .bind(&data.description)
            .bind(&data.location)
            .bind(&data.contact_email)
            .bind(&data.phone)
            .bind(&data.logo_url)
            .fetch_one(pool)
            .await;

            match result {
                Ok(academy) => {
                    info!(academy_id = %academy.id, slug = %academy.slug, "Academy created");
                    return Ok(academy);
                }
                Err(e)
                    if is_unique_violation(&e, SLUG_CONSTRAINT)
                        && attempt + 1 < slug::MAX_SLUG_ATTEMPTS =>
                {
                    debug!(slug = %candidate, "Academy slug taken, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Academy>("SELECT * FROM academies WHERE id = $1 AND is_active = TRUE")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Academy>("SELECT * FROM academies WHERE slug = $1 AND is_active = TRUE")
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Active academies, best rated first
    pub async fn list(
        pool: &PgPool,
        filter: &AcademyFilter,
        page: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Academy>(
            r#"
            SELECT * FROM academies
            WHERE is_active = TRUE
              AND ($1::uuid IS NULL OR category_id = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR location ILIKE $2)
            ORDER BY average_rating DESC, review_count DESC, created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.category)
        .bind(super::search_pattern(filter.q.as_deref()))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateAcademy) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Academy>(
            r#"
            UPDATE academies
            SET category_id = COALESCE($2, category_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                location = COALESCE($5, location),
                contact_email = COALESCE($6, contact_email),
                phone = COALESCE($7, phone),
                logo_url = COALESCE($8, logo_url),
                updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.category_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.location)
        .bind(data.contact_email)
        .bind(data.phone)
        .bind(data.logo_url)
        .fetch_optional(pool)
        .await
    }

    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE academies SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
