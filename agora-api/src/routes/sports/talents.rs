/// Talent listing endpoints
///
/// - `GET /v1/sports/talents?category=&position=&q=` - Active talents
/// - `GET /v1/sports/talents/:id` - Talent by id or slug
/// - `POST /v1/sports/talents` - Create (auth, caller becomes owner)
/// - `PATCH /v1/sports/talents/:id` - Update (owner)
/// - `DELETE /v1/sports/talents/:id` - Soft delete (owner)

use super::require_category;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, SuccessResponse},
    routes::{IdOrSlug, Listing},
};
use agora_shared::auth::{authorization::require_ownership, middleware::AuthContext};
use agora_shared::models::talent::{CreateTalent, Talent, TalentFilter, UpdateTalent};
use agora_shared::models::Pagination;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTalentRequest {
    pub category_id: Uuid,

    #[validate(length(min = 2, max = 120, message = "Full name must be 2-120 characters"))]
    pub full_name: String,

    #[validate(length(max = 60, message = "Position must be at most 60 characters"))]
    pub position: Option<String>,

    pub date_of_birth: Option<NaiveDate>,

    #[validate(length(max = 5000, message = "Bio must be at most 5000 characters"))]
    pub bio: Option<String>,

    #[serde(default)]
    #[validate(length(max = 50, message = "At most 50 achievements"))]
    pub achievements: Vec<String>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 media items"))]
    pub media_urls: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTalentRequest {
    pub category_id: Option<Uuid>,

    #[validate(length(min = 2, max = 120, message = "Full name must be 2-120 characters"))]
    pub full_name: Option<String>,

    #[validate(length(max = 60, message = "Position must be at most 60 characters"))]
    pub position: Option<String>,

    pub date_of_birth: Option<NaiveDate>,

    #[validate(length(max = 5000, message = "Bio must be at most 5000 characters"))]
    pub bio: Option<String>,

    #[validate(length(max = 50, message = "At most 50 achievements"))]
    pub achievements: Option<Vec<String>>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 20, message = "At most 20 media items"))]
    pub media_urls: Option<Vec<String>>,
}

/// Birth dates must be in the past
fn check_date_of_birth(date: Option<NaiveDate>) -> ApiResult<()> {
    match date {
        Some(d) if d >= Utc::now().date_naive() => Err(ApiError::invalid(
            "date_of_birth",
            "Date of birth must be in the past",
        )),
        _ => Ok(()),
    }
}

pub async fn list_talents(
    State(state): State<AppState>,
    Query(filter): Query<TalentFilter>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Listing<Talent>>> {
    let talents = Talent::list(&state.db, &filter, page).await?;
    Ok(Listing::new(talents, page))
}

pub async fn get_talent(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Talent>> {
    let talent = match IdOrSlug::parse(&key) {
        IdOrSlug::Id(id) => Talent::find_by_id(&state.db, id).await?,
        IdOrSlug::Slug(slug) => Talent::find_by_slug(&state.db, &slug).await?,
    };

    talent
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Talent not found".to_string()))
}

pub async fn create_talent(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateTalentRequest>,
) -> ApiResult<(StatusCode, Json<Talent>)> {
    req.validate()?;
    check_date_of_birth(req.date_of_birth)?;
    require_category(&state.db, req.category_id).await?;

    let talent = Talent::create(
        &state.db,
        auth.user_id,
        CreateTalent {
            category_id: req.category_id,
            full_name: req.full_name.trim().to_string(),
            position: req.position,
            date_of_birth: req.date_of_birth,
            bio: req.bio,
            achievements: req.achievements,
            location: req.location,
            media_urls: req.media_urls,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(talent)))
}

async fn owned_talent(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Talent> {
    let talent = Talent::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Talent not found".to_string()))?;
    require_ownership(auth, talent.owner_id)?;
    Ok(talent)
}

pub async fn update_talent(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(talent_id): Path<Uuid>,
    Json(req): Json<UpdateTalentRequest>,
) -> ApiResult<Json<Talent>> {
    req.validate()?;
    check_date_of_birth(req.date_of_birth)?;
    owned_talent(&state, &auth, talent_id).await?;

    if let Some(category_id) = req.category_id {
        require_category(&state.db, category_id).await?;
    }

    Talent::update(
        &state.db,
        talent_id,
        UpdateTalent {
            category_id: req.category_id,
            full_name: req.full_name.map(|n| n.trim().to_string()),
            position: req.position,
            date_of_birth: req.date_of_birth,
            bio: req.bio,
            achievements: req.achievements,
            location: req.location,
            media_urls: req.media_urls,
        },
    )
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("Talent not found".to_string()))
}

pub async fn delete_talent(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(talent_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    owned_talent(&state, &auth, talent_id).await?;
    Talent::deactivate(&state.db, talent_id).await?;

    tracing::info!(user_id = %auth.user_id, talent_id = %talent_id, "Talent deactivated");

    Ok(SuccessResponse::new("Talent deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_of_birth_must_be_past() {
        assert!(check_date_of_birth(None).is_ok());
        assert!(check_date_of_birth(NaiveDate::from_ymd_opt(2004, 5, 17)).is_ok());

        let tomorrow = Utc::now().date_naive().succ_opt();
        assert!(check_date_of_birth(tomorrow).is_err());
    }
}
