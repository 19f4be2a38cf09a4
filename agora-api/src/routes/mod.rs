/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check
/// - `users`: Own profile and public profiles
/// - `pages`: Clubs, schools and companies; `members` and `company` hang off them
/// - `posts`: Page posts, reactions and the member feed
/// - `sports`: Categories, academies, talents and reviews
/// - `inquiries`, `conversations`: Contact-then-chat flow
/// - `contributions`: Contributions and the live totals stream
/// - `media`: Image/video uploads

pub mod company;
pub mod contributions;
pub mod conversations;
pub mod health;
pub mod inquiries;
pub mod media;
pub mod members;
pub mod pages;
pub mod posts;
pub mod sports;
pub mod users;

use crate::error::{ApiError, ApiResult};
use agora_shared::models::page::Page;
use agora_shared::models::user::User;
use agora_shared::models::Pagination;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Paginated list body
#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub limit: i64,
    pub offset: i64,
}

impl<T: Serialize> Listing<T> {
    pub fn new(items: Vec<T>, page: Pagination) -> Json<Self> {
        Json(Self {
            items,
            limit: page.limit(),
            offset: page.offset(),
        })
    }
}

/// Path segment addressing a resource by id or by slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOrSlug {
    Id(Uuid),
    Slug(String),
}

impl IdOrSlug {
    pub fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw) {
            Ok(id) => IdOrSlug::Id(id),
            Err(_) => IdOrSlug::Slug(raw.to_lowercase()),
        }
    }
}

/// Active page or 404
pub(crate) async fn load_page(db: &PgPool, page_id: Uuid) -> ApiResult<Page> {
    Page::find_by_id(db, page_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Page not found".to_string()))
}

/// Active page by id or slug, or 404
pub(crate) async fn resolve_page(db: &PgPool, key: &str) -> ApiResult<Page> {
    let page = match IdOrSlug::parse(key) {
        IdOrSlug::Id(id) => Page::find_by_id(db, id).await?,
        IdOrSlug::Slug(slug) => Page::find_by_slug(db, &slug).await?,
    };

    page.ok_or_else(|| ApiError::NotFound("Page not found".to_string()))
}

/// Active user or 404
pub(crate) async fn load_user(db: &PgPool, user_id: Uuid) -> ApiResult<User> {
    User::find_by_id(db, user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Active user to notify, or `None` after logging why the email is skipped
///
/// Runs after the user action is saved, so a lookup failure must not turn
/// into an error response.
pub(crate) async fn notification_recipient(db: &PgPool, user_id: Uuid) -> Option<User> {
    match load_user(db, user_id).await {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Notification recipient unavailable, email skipped");
            None
        }
    }
}

/// Display name used in notifications
pub(crate) fn display_name(user: &User) -> String {
    user.name.clone().unwrap_or_else(|| user.username.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_or_slug() {
        let id = Uuid::new_v4();
        assert_eq!(IdOrSlug::parse(&id.to_string()), IdOrSlug::Id(id));
        assert_eq!(
            IdOrSlug::parse("Accra-Lions"),
            IdOrSlug::Slug("accra-lions".to_string())
        );
    }

    #[test]
    fn test_listing_uses_clamped_pagination() {
        let Json(listing) = Listing::new(vec![1, 2, 3], Pagination::new(500, -4));
        assert_eq!(listing.items.len(), 3);
        assert_eq!(listing.limit, 100);
        assert_eq!(listing.offset, 0);
    }
}
