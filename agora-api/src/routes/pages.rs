/// Page endpoints (clubs, schools, companies)
///
/// # Endpoints
///
/// - `GET /v1/pages?kind=&q=` - List active pages
/// - `GET /v1/pages/:id` - Page by id or slug
/// - `POST /v1/pages` - Create a page, caller becomes owner (auth)
/// - `PATCH /v1/pages/:id` - Update (page admin)
/// - `DELETE /v1/pages/:id` - Soft delete (page owner)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, SuccessResponse},
    routes::{resolve_page, Listing},
};
use agora_shared::auth::{authorization::require_page_role, middleware::AuthContext};
use agora_shared::models::membership::MemberRole;
use agora_shared::models::page::{CreatePage, Page, PageFilter, PageKind, UpdatePage};
use agora_shared::models::Pagination;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePageRequest {
    #[serde(default)]
    pub kind: PageKind,

    #[validate(length(min = 2, max = 120, message = "Name must be 2-120 characters"))]
    pub name: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "Logo must be a valid URL"))]
    pub logo_url: Option<String>,

    #[validate(url(message = "Cover must be a valid URL"))]
    pub cover_url: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePageRequest {
    #[validate(length(min = 2, max = 120, message = "Name must be 2-120 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "Logo must be a valid URL"))]
    pub logo_url: Option<String>,

    #[validate(url(message = "Cover must be a valid URL"))]
    pub cover_url: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
}

pub async fn list_pages(
    State(state): State<AppState>,
    Query(filter): Query<PageFilter>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Listing<Page>>> {
    let pages = Page::list(&state.db, &filter, page).await?;
    Ok(Listing::new(pages, page))
}

pub async fn get_page(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Page>> {
    Ok(Json(resolve_page(&state.db, &key).await?))
}

/// Creates a page owned by the caller
///
/// The slug is derived from the name; a clash gets a random suffix.
///
/// # Response
///
/// `201 Created` with the page.
pub async fn create_page(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreatePageRequest>,
) -> ApiResult<(StatusCode, Json<Page>)> {
    req.validate()?;

    let page = Page::create(
        &state.db,
        auth.user_id,
        CreatePage {
            kind: req.kind,
            name: req.name.trim().to_string(),
            description: req.description,
            logo_url: req.logo_url,
            cover_url: req.cover_url,
            website: req.website,
            location: req.location,
        },
    )
    .await?;

    tracing::info!(
        user_id = %auth.user_id,
        page_id = %page.id,
        kind = page.kind.as_str(),
        "Page created"
    );

    Ok((StatusCode::CREATED, Json(page)))
}

pub async fn update_page(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(page_id): Path<Uuid>,
    Json(req): Json<UpdatePageRequest>,
) -> ApiResult<Json<Page>> {
    req.validate()?;
    require_page_role(&state.db, page_id, auth.user_id, MemberRole::Admin).await?;

    let page = Page::update(
        &state.db,
        page_id,
        UpdatePage {
            name: req.name.map(|n| n.trim().to_string()),
            description: req.description,
            logo_url: req.logo_url,
            cover_url: req.cover_url,
            website: req.website,
            location: req.location,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Page not found".to_string()))?;

    Ok(Json(page))
}

pub async fn delete_page(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(page_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    require_page_role(&state.db, page_id, auth.user_id, MemberRole::Owner).await?;

    if !Page::deactivate(&state.db, page_id).await? {
        return Err(ApiError::NotFound("Page not found".to_string()));
    }

    tracing::info!(user_id = %auth.user_id, page_id = %page_id, "Page deactivated");

    Ok(SuccessResponse::new("Page deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_page_request_defaults_to_club() {
        let req: CreatePageRequest =
            serde_json::from_value(serde_json::json!({ "name": "Accra Lions" })).unwrap();
        assert_eq!(req.kind, PageKind::Club);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_page_request_rejects_short_name() {
        let req: CreatePageRequest =
            serde_json::from_value(serde_json::json!({ "name": "A", "kind": "school" })).unwrap();
        assert_eq!(req.kind, PageKind::School);
        assert!(req.validate().is_err());
    }
}
