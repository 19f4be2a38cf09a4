/// Monetary contributions to pages
///
/// A contribution starts `pending` and is accepted or rejected by a page
/// admin. Only accepted contributions count towards the page totals that the
/// live counter streams.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Pagination, RequestStatus};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contribution {
    pub id: Uuid,
    pub page_id: Uuid,
    pub contributor_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub message: Option<String>,
    pub is_anonymous: bool,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row; contributor fields are `None` for anonymous contributions
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContributionView {
    pub id: Uuid,
    pub page_id: Uuid,
    pub contributor_id: Option<Uuid>,
    pub contributor_username: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub message: Option<String>,
    pub is_anonymous: bool,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContribution {
    pub amount_cents: i64,
    pub currency: String,
    pub message: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Accepted total in one currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CurrencyTotal {
    pub currency: String,
    pub amount_cents: i64,
    pub count: i64,
}

/// Snapshot of a page's accepted contributions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionTotals {
    pub page_id: Uuid,
    pub contribution_count: i64,
    pub totals: Vec<CurrencyTotal>,
    pub as_of: DateTime<Utc>,
}

impl ContributionTotals {
    pub fn from_currency_totals(page_id: Uuid, totals: Vec<CurrencyTotal>, as_of: DateTime<Utc>) -> Self {
        Self {
            page_id,
            contribution_count: totals.iter().map(|t| t.count).sum(),
            totals,
            as_of,
        }
    }
}

/// Normalises a currency code to upper-case ISO 4217 form
///
/// Returns `None` unless the input is exactly three ASCII letters.
pub fn normalize_currency(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        None
    }
}

impl Contribution {
    pub async fn create(
        pool: &PgPool,
        page_id: Uuid,
        contributor_id: Uuid,
        data: CreateContribution,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Contribution>(
            r#"
            INSERT INTO contributions (page_id, contributor_id, amount_cents, currency, message, is_anonymous)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(page_id)
        .bind(contributor_id)
        .bind(data.amount_cents)
        .bind(data.currency)
        .bind(data.message)
        .bind(data.is_anonymous)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contribution>("SELECT * FROM contributions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Contributions of a page in `status`, newest first
    pub async fn list_for_page(
        pool: &PgPool,
        page_id: Uuid,
        status: RequestStatus,
        page: Pagination,
    ) -> Result<Vec<ContributionView>, sqlx::Error> {
        sqlx::query_as::<_, ContributionView>(
            r#"
            SELECT
                c.id, c.page_id,
                CASE WHEN c.is_anonymous THEN NULL ELSE c.contributor_id END AS contributor_id,
                CASE WHEN c.is_anonymous THEN NULL ELSE u.username END AS contributor_username,
                c.amount_cents, c.currency, c.message, c.is_anonymous, c.status, c.created_at
            FROM contributions c
            JOIN users u ON u.id = c.contributor_id
            WHERE c.page_id = $1 AND c.status = $2
            ORDER BY c.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(page_id)
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    /// Moves a pending contribution to `status`; `None` if it is not pending
    pub async fn decide(pool: &PgPool, id: Uuid, status: RequestStatus) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contribution>(
            r#"
            UPDATE contributions SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(RequestStatus::Pending)
        .fetch_optional(pool)
        .await
    }

    /// Sums accepted contributions of a page per currency
    pub async fn totals(pool: &PgPool, page_id: Uuid) -> Result<ContributionTotals, sqlx::Error> {
        let totals = sqlx::query_as::<_, CurrencyTotal>(
            r#"
            SELECT currency, SUM(amount_cents)::BIGINT AS amount_cents, COUNT(*) AS count
            FROM contributions
            WHERE page_id = $1 AND status = $2
            GROUP BY currency
            ORDER BY currency
            "#,
        )
        .bind(page_id)
        .bind(RequestStatus::Accepted)
        .fetch_all(pool)
        .await?;

        Ok(ContributionTotals::from_currency_totals(page_id, totals, Utc::now()))
    }
}
