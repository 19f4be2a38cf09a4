/// Page model: clubs, schools and companies
///
/// A page is the tenant boundary of the community side. Posts, memberships,
/// contributions and the company profile all hang off a page, and page roles
/// (see [`membership`](super::membership)) gate every mutation on it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE page_kind AS ENUM ('club', 'school', 'company');
///
/// CREATE TABLE pages (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     kind page_kind NOT NULL,
///     name VARCHAR(200) NOT NULL,
///     slug VARCHAR(220) NOT NULL,          -- unique
///     description TEXT,
///     logo_url VARCHAR(1024),
///     cover_url VARCHAR(1024),
///     website VARCHAR(1024),
///     location VARCHAR(255),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::membership::MemberRole;
use super::{Pagination, RequestStatus};
use crate::db::is_unique_violation;
use crate::slug;

const SLUG_CONSTRAINT: &str = "pages_slug_key";

/// Kind of community page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "page_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    #[default]
    Club,
    School,
    Company,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Club => "club",
            PageKind::School => "school",
            PageKind::Company => "company",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Page {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: PageKind,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePage {
    pub kind: PageKind,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

/// Page changes; `None` leaves a field untouched. The slug never changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePage {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

/// List filters for `GET /v1/pages`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageFilter {
    pub kind: Option<PageKind>,
    pub q: Option<String>,
}

impl Page {
    /// Creates a page and its accepted owner membership in one transaction
    ///
    /// The slug is derived from the name; on a clash the insert is retried
    /// with a random suffix.
    pub async fn create(pool: &PgPool, owner_id: Uuid, data: CreatePage) -> Result<Self, sqlx::Error> {
        let base = slug::slugify(&data.name);
        let mut attempt = 0;

        loop {
            let candidate = slug::candidate(&base, attempt);
            let mut tx = pool.begin().await?;

            let inserted = sqlx::query_as::<_, Page>(
                r#"
                INSERT INTO pages (owner_id, kind, name, slug, description, logo_url, cover_url, website, location)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
                "#,
            )
            .bind(owner_id)
            .bind(data.kind)
            .bind(&data.name)
            .bind(&candidate)
            .bind(&data.description)
            .bind(&data.logo_url)
            .bind(&data.cover_url)
            .bind(&data.website)
            .bind(&data.location)
            .fetch_one(&mut *tx)
            .await;

            let page = match inserted {
                Ok(page) => page,
                Err(e)
                    if is_unique_violation(&e, SLUG_CONSTRAINT)
                        && attempt + 1 < slug::MAX_SLUG_ATTEMPTS =>
                {
                    debug!(slug = %candidate, "Page slug taken, retrying");
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            sqlx::query(
                "INSERT INTO page_members (page_id, user_id, role, status) VALUES ($1, $2, $3, $4)",
            )
            .bind(page.id)
            .bind(owner_id)
            .bind(MemberRole::Owner)
            .bind(RequestStatus::Accepted)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;

            info!(page_id = %page.id, slug = %page.slug, kind = page.kind.as_str(), "Page created");
            return Ok(page);
        }
    }

    /// Active page by id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE id = $1 AND is_active = TRUE")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active page by slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE slug = $1 AND is_active = TRUE")
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Active pages, newest first, optionally filtered by kind and name
    pub async fn list(
        pool: &PgPool,
        filter: &PageFilter,
        page: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Page>(
            r#"
            SELECT * FROM pages
            WHERE is_active = TRUE
              AND ($1::page_kind IS NULL OR kind = $1)
              AND ($2::text IS NULL OR name ILIKE $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.kind)
        .bind(super::search_pattern(filter.q.as_deref()))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdatePage) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Page>(
            r#"
            UPDATE pages
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                logo_url = COALESCE($4, logo_url),
                cover_url = COALESCE($5, cover_url),
                website = COALESCE($6, website),
                location = COALESCE($7, location),
                updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.logo_url)
        .bind(data.cover_url)
        .bind(data.website)
        .bind(data.location)
        .fetch_optional(pool)
        .await
    }

    /// Soft-deletes the page
    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pages SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active = TRUE",
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
    fn test_page_kind_serde() {
        let kind: PageKind = serde_json::from_str("\"school\"").unwrap();
        assert_eq!(kind, PageKind::School);
        assert_eq!(serde_json::to_string(&PageKind::Company).unwrap(), "\"company\"");
        assert!(serde_json::from_str::<PageKind>("\"league\"").is_err());
    }

    #[test]
    fn test_create_page_deserialize() {
        let data: CreatePage = serde_json::from_str(r#"{"kind":"club","name":"Riverside FC"}"#).unwrap();
        assert_eq!(data.name, "Riverside FC");
        assert_eq!(data.kind, PageKind::Club);
        assert!(data.description.is_none());
    }
}
