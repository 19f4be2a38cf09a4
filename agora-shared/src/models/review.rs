/// Reviews of academies and talents, and rating aggregation
///
/// Every review write (create, update, delete) recomputes the target's
/// `average_rating` and `review_count` from the full set of its reviews:
///
/// ```text
/// review_count   = number of reviews
/// average_rating = round(sum(rating) / review_count, 1)   -- 0.0 with no reviews
/// ```
///
/// The write and the recompute run in one transaction that takes a row lock
/// on the listing after writing. Writers on the same listing recompute one
/// at a time, each after the previous one committed, so the last summary
/// stored counts every review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::Pagination;

/// Kind of marketplace listing a review or inquiry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_target", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Academy,
    Talent,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Academy => "academy",
            ListingKind::Talent => "talent",
        }
    }

    fn table(&self) -> &'static str {
        match self {
            ListingKind::Academy => "academies",
            ListingKind::Talent => "talents",
        }
    }

    /// Owner and display name of an active listing
    pub async fn find_owner(
        &self,
        pool: &PgPool,
        listing_id: Uuid,
    ) -> Result<Option<ListingOwner>, sqlx::Error> {
        let name_column = match self {
            ListingKind::Academy => "name",
            ListingKind::Talent => "full_name",
        };
        let sql = format!(
            "SELECT owner_id, {} AS name FROM {} WHERE id = $1 AND is_active = TRUE",
            name_column,
            self.table()
        );

        sqlx::query_as::<_, ListingOwner>(&sql)
            .bind(listing_id)
            .fetch_optional(pool)
            .await
    }
}

/// Who owns a listing
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingOwner {
    pub owner_id: Uuid,
    pub name: String,
}

/// Denormalised rating of a listing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub review_count: i32,
}

impl RatingSummary {
    /// Mean of `sum` over `count` reviews, rounded to one decimal
    pub fn from_totals(count: i64, sum: i64) -> Self {
        if count <= 0 {
            return Self {
                average_rating: 0.0,
                review_count: 0,
            };
        }

        let mean = sum as f64 / count as f64;
        Self {
            average_rating: (mean * 10.0).round() / 10.0,
            review_count: count as i32,
        }
    }

    pub fn from_ratings(ratings: &[i16]) -> Self {
        let sum = ratings.iter().map(|r| i64::from(*r)).sum();
        Self::from_totals(ratings.len() as i64, sum)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub target_kind: ListingKind,
    pub target_id: Uuid,
    pub author_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review with the author's public handle
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub author_username: String,
    pub author_avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateReview {
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReview {
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

impl Review {
    /// Inserts a review and refreshes the target's rating
    ///
    /// # Errors
    ///
    /// A second review by the same author on the same target surfaces as a
    /// unique violation on `reviews_target_author_key`.
    pub async fn create(
        pool: &PgPool,
        target_kind: ListingKind,
        target_id: Uuid,
        author_id: Uuid,
        data: CreateReview,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (target_kind, target_id, author_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(target_kind)
        .bind(target_id)
        .bind(author_id)
        .bind(data.rating)
        .bind(data.comment)
        .fetch_one(&mut *tx)
        .await?;

        recompute_rating(&mut *tx, target_kind, target_id).await?;
        tx.commit().await?;
        Ok(review)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Reviews of a listing, newest first
    pub async fn list_for_target(
        pool: &PgPool,
        target_kind: ListingKind,
        target_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<ReviewView>, sqlx::Error> {
        sqlx::query_as::<_, ReviewView>(
            r#"
            SELECT r.*, u.username AS author_username, u.avatar_url AS author_avatar_url
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            WHERE r.target_kind = $1 AND r.target_id = $2
            ORDER BY r.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(target_kind)
        .bind(target_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    /// Updates rating/comment and refreshes the target's rating
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateReview) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET rating = COALESCE($2, rating),
                comment = COALESCE($3, comment),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.rating)
        .bind(data.comment)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(ref review) = review {
            recompute_rating(&mut *tx, review.target_kind, review.target_id).await?;
        }

        tx.commit().await?;
        Ok(review)
    }

    /// Deletes the review and refreshes the target's rating
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let deleted = sqlx::query_as::<_, (ListingKind, Uuid)>(
            "DELETE FROM reviews WHERE id = $1 RETURNING target_kind, target_id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((kind, target_id)) = deleted else {
            return Ok(false);
        };

        recompute_rating(&mut *tx, kind, target_id).await?;
        tx.commit().await?;
        Ok(true)
    }
}

/// Recomputes and stores the rating summary of a listing
///
/// Locks the listing row first; call it inside the transaction that wrote
/// the review.
pub async fn recompute_rating(
    conn: &mut PgConnection,
    target_kind: ListingKind,
    target_id: Uuid,
) -> Result<RatingSummary, sqlx::Error> {
    let lock = format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", target_kind.table());
    sqlx::query(&lock).bind(target_id).execute(&mut *conn).await?;

    let (count, sum): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(SUM(rating), 0)::BIGINT
        FROM reviews
        WHERE target_kind = $1 AND target_id = $2
        "#,
    )
    .bind(target_kind)
    .bind(target_id)
    .fetch_one(&mut *conn)
    .await?;

    let summary = RatingSummary::from_totals(count, sum);

    let sql = format!(
        "UPDATE {} SET average_rating = $2, review_count = $3 WHERE id = $1",
        target_kind.table()
    );
    sqlx::query(&sql)
        .bind(target_id)
        .bind(summary.average_rating)
        .bind(summary.review_count)
        .execute(&mut *conn)
        .await?;

    debug!(
        target = target_kind.as_str(),
        %target_id,
        average_rating = summary.average_rating,
        review_count = summary.review_count,
        "Rating recomputed"
    );

    Ok(summary)
}
