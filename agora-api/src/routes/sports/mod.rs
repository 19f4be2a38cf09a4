/// Sports marketplace endpoints
///
/// - `categories`: Sport categories (platform admin writes)
/// - `academies`: Academy listings
/// - `talents`: Talent listings
/// - `reviews`: Reviews of academies and talents with rating aggregation

pub mod academies;
pub mod categories;
pub mod reviews;
pub mod talents;

use crate::error::{ApiError, ApiResult};
use agora_shared::models::sport::SportCategory;
use sqlx::PgPool;
use uuid::Uuid;

/// Listings must point at an active category
pub(crate) async fn require_category(db: &PgPool, category_id: Uuid) -> ApiResult<()> {
    SportCategory::find_by_id(db, category_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::invalid("category_id", "Unknown sport category"))
}
