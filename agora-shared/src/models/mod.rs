/// Database models for Agora
///
/// Each module owns one table (or a tight pair of tables) and exposes its
/// queries as associated functions taking `&PgPool`.
///
/// # Models
///
/// - `user`: Local accounts synchronised from provider sessions
/// - `page`: Clubs, schools and companies
/// - `membership`: Page membership requests and roles
/// - `company`: Company profile attached to a company page
/// - `post` / `reaction`: Page posts and like/dislike votes
/// - `sport`, `academy`, `talent`, `review`: Sports marketplace listings
/// - `inquiry`, `conversation`: Contact-then-chat flow
/// - `contribution`: Monetary contributions to pages
/// - `outbox`: Queued notification emails
///
/// # Example
///
/// ```no_run
/// use agora_shared::models::page::{CreatePage, Page, PageKind};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), sqlx::Error> {
/// let page = Page::create(&pool, owner_id, CreatePage {
///     kind: PageKind::Club,
///     name: "Riverside FC".to_string(),
///     ..Default::default()
/// }).await?;
/// assert_eq!(page.slug, "riverside-fc");
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};

pub mod academy;
pub mod company;
pub mod contribution;
pub mod conversation;
pub mod inquiry;
pub mod membership;
pub mod outbox;
pub mod page;
pub mod post;
pub mod reaction;
pub mod review;
pub mod sport;
pub mod talent;
pub mod user;

/// Default page size for list endpoints
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest page size a client may request
pub const MAX_LIMIT: i64 = 100;

/// Review state shared by membership requests, inquiries and contributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// `limit`/`offset` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Requested limit clamped to `1..=MAX_LIMIT`
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Requested offset, never negative
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Builds an `ILIKE` pattern from a free-text search term
///
/// Returns `None` for blank input so callers can bind it straight into
/// `($n::text IS NULL OR col ILIKE $n)`.
pub fn search_pattern(q: Option<&str>) -> Option<String> {
    let q = q?.trim();
    if q.is_empty() {
        return None;
    }

    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{}%", escaped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_serde() {
        let json = serde_json::to_string(&RequestStatus::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");

        let parsed: RequestStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, RequestStatus::Pending);
        assert_eq!(RequestStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_clamps() {
        assert_eq!(Pagination::new(500, 0).limit(), MAX_LIMIT);
        assert_eq!(Pagination::new(0, 0).limit(), 1);
        assert_eq!(Pagination::new(10, -5).offset(), 0);
        assert_eq!(Pagination::new(10, 40).offset(), 40);
    }

    #[test]
    fn test_search_pattern() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(Some("tennis")), Some("%tennis%".to_string()));
        assert_eq!(search_pattern(Some("50%")), Some("%50\\%%".to_string()));
    }
}
