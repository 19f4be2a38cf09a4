/// Academy listing endpoints
///
/// - `GET /v1/sports/academies?category=&q=` - Active academies, best rated first
/// - `GET /v1/sports/academies/:id` - Academy by id or slug
/// - `POST /v1/sports/academies` - Create (auth, caller becomes owner)
/// - `PATCH /v1/sports/academies/:id` - Update (owner)
/// - `DELETE /v1/sports/academies/:id` - Soft delete (owner)

use super::require_category;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, SuccessResponse},
    routes::{IdOrSlug, Listing},
};
use agora_shared::auth::{authorization::require_ownership, middleware::AuthContext};
use agora_shared::models::academy::{Academy, AcademyFilter, CreateAcademy, UpdateAcademy};
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
pub struct CreateAcademyRequest {
    pub category_id: Uuid,

    #[validate(length(min = 2, max = 120, message = "Name must be 2-120 characters"))]
    pub name: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    #[validate(email(message = "Contact email must be a valid email address"))]
    pub contact_email: Option<String>,

    #[validate(length(min = 5, max = 30, message = "Phone must be 5-30 characters"))]
    pub phone: Option<String>,

    #[validate(url(message = "Logo must be a valid URL"))]
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAcademyRequest {
    pub category_id: Option<Uuid>,

    #[validate(length(min = 2, max = 120, message = "Name must be 2-120 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    #[validate(email(message = "Contact email must be a valid email address"))]
    pub contact_email: Option<String>,

    #[validate(length(min = 5, max = 30, message = "Phone must be 5-30 characters"))]
    pub phone: Option<String>,

    #[validate(url(message = "Logo must be a valid URL"))]
    pub logo_url: Option<String>,
}

pub async fn list_academies(
    State(state): State<AppState>,
    Query(filter): Query<AcademyFilter>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Listing<Academy>>> {
    let academies = Academy::list(&state.db, &filter, page).await?;
    Ok(Listing::new(academies, page))
}

pub async fn get_academy(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Academy>> {
    let academy = match IdOrSlug::parse(&key) {
        IdOrSlug::Id(id) => Academy::find_by_id(&state.db, id).await?,
        IdOrSlug::Slug(slug) => Academy::find_by_slug(&state.db, &slug).await?,
    };

    academy
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Academy not found".to_string()))
}

pub async fn create_academy(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateAcademyRequest>,
) -> ApiResult<(StatusCode, Json<Academy>)> {
    req.validate()?;
    require_category(&state.db, req.category_id).await?;

    let academy = Academy::create(
        &state.db,
        auth.user_id,
        CreateAcademy {
            category_id: req.category_id,
            name: req.name.trim().to_string(),
            description: req.description,
            location: req.location,
            contact_email: req.contact_email,
            phone: req.phone,
            logo_url: req.logo_url,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(academy)))
}

async fn owned_academy(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Academy> {
    let academy = Academy::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Academy not found".to_string()))?;
    require_ownership(auth, academy.owner_id)?;
    Ok(academy)
}

pub async fn update_academy(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(academy_id): Path<Uuid>,
    Json(req): Json<UpdateAcademyRequest>,
) -> ApiResult<Json<Academy>> {
    req.validate()?;
    owned_academy(&state, &auth, academy_id).await?;

    if let Some(category_id) = req.category_id {
        require_category(&state.db, category_id).await?;
    }

    Academy::update(
        &state.db,
        academy_id,
        UpdateAcademy {
            category_id: req.category_id,
            name: req.name.map(|n| n.trim().to_string()),
            description: req.description,
            location: req.location,
            contact_email: req.contact_email,
            phone: req.phone,
            logo_url: req.logo_url,
        },
    )
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("Academy not found".to_string()))
}

pub async fn delete_academy(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(academy_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    owned_academy(&state, &auth, academy_id).await?;
    Academy::deactivate(&state.db, academy_id).await?;

    tracing::info!(user_id = %auth.user_id, academy_id = %academy_id, "Academy deactivated");

    Ok(SuccessResponse::new("Academy deleted"))
}
