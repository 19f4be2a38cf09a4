/// Sport category endpoints
///
/// - `GET /v1/sports/categories` - Active categories
/// - `POST /v1/sports/categories` - Create (platform admin)
/// - `PATCH /v1/sports/categories/:id` - Update (platform admin)
/// - `DELETE /v1/sports/categories/:id` - Soft delete (platform admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, SuccessResponse},
};
use agora_shared::auth::{authorization::require_admin, middleware::AuthContext};
use agora_shared::models::sport::{CreateSportCategory, SportCategory, UpdateSportCategory};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 2, max = 80, message = "Name must be 2-80 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 2, max = 80, message = "Name must be 2-80 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<SportCategory>>> {
    Ok(Json(SportCategory::list(&state.db).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<SportCategory>)> {
    require_admin(&auth)?;
    req.validate()?;

    let category = SportCategory::create(
        &state.db,
        CreateSportCategory {
            name: req.name.trim().to_string(),
            description: req.description,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(category_id): Path<Uuid>,
    Json(req): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<SportCategory>> {
    require_admin(&auth)?;
    req.validate()?;

    SportCategory::update(
        &state.db,
        category_id,
        UpdateSportCategory {
            name: req.name.map(|n| n.trim().to_string()),
            description: req.description,
        },
    )
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))
}

pub async fn delete_category(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(category_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    require_admin(&auth)?;

    if !SportCategory::deactivate(&state.db, category_id).await? {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }

    tracing::info!(user_id = %auth.user_id, category_id = %category_id, "Category deactivated");

    Ok(SuccessResponse::new("Category deleted"))
}
