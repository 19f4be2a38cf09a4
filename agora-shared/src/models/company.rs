/// Company profile attached to a `company` page
///
/// One row per page, keyed by `page_id`. Writes are upserts so the first
/// `PUT` creates the profile and later ones replace it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompanyProfile {
    pub page_id: Uuid,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub founded_year: Option<i32>,
    pub headquarters: Option<String>,
    pub services: Vec<String>,
    pub contact_email: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement of the profile fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertCompanyProfile {
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub founded_year: Option<i32>,
    pub headquarters: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    pub contact_email: Option<String>,
}

impl CompanyProfile {
    pub async fn find(pool: &PgPool, page_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CompanyProfile>("SELECT * FROM company_profiles WHERE page_id = $1")
            .bind(page_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn upsert(
        pool: &PgPool,
        page_id: Uuid,
        data: UpsertCompanyProfile,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CompanyProfile>(
            r#"
            INSERT INTO company_profiles
                (page_id, industry, company_size, founded_year, headquarters, services, contact_email)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (page_id) DO UPDATE SET
                industry = EXCLUDED.industry,
                company_size = EXCLUDED.company_size,
                founded_year = EXCLUDED.founded_year,
                headquarters = EXCLUDED.headquarters,
                services = EXCLUDED.services,
                contact_email = EXCLUDED.contact_email,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(page_id)
        .bind(data.industry)
        .bind(data.company_size)
        .bind(data.founded_year)
        .bind(data.headquarters)
        .bind(data.services)
        .bind(data.contact_email)
        .fetch_one(pool)
        .await
    }
}
