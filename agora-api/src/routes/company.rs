/// Company profile endpoints
///
/// - `GET /v1/pages/:id/company-profile` - Profile of a company page (id or slug)
/// - `PUT /v1/pages/:id/company-profile` - Create or replace (page admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{load_page, resolve_page},
};
use agora_shared::auth::{authorization::require_page_role, middleware::AuthContext};
use agora_shared::models::company::{CompanyProfile, UpsertCompanyProfile};
use agora_shared::models::membership::MemberRole;
use agora_shared::models::page::PageKind;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CompanyProfileRequest {
    #[validate(length(max = 120, message = "Industry must be at most 120 characters"))]
    pub industry: Option<String>,

    #[validate(length(max = 40, message = "Company size must be at most 40 characters"))]
    pub company_size: Option<String>,

    #[validate(range(min = 1800, max = 2100, message = "Founded year is out of range"))]
    pub founded_year: Option<i32>,

    #[validate(length(max = 255, message = "Headquarters must be at most 255 characters"))]
    pub headquarters: Option<String>,

    #[serde(default)]
    #[validate(length(max = 50, message = "At most 50 services"))]
    pub services: Vec<String>,

    #[validate(email(message = "Contact email must be a valid email address"))]
    pub contact_email: Option<String>,
}

pub async fn get_company_profile(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<CompanyProfile>> {
    let page = resolve_page(&state.db, &key).await?;

    CompanyProfile::find(&state.db, page.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Company profile not found".to_string()))
}

/// Upserts the company profile
///
/// # Errors
///
/// - `400 Bad Request`: The page is not a company page
/// - `403 Forbidden`: Caller is not a page admin
pub async fn put_company_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(page_id): Path<Uuid>,
    Json(req): Json<CompanyProfileRequest>,
) -> ApiResult<Json<CompanyProfile>> {
    req.validate()?;

    let page = load_page(&state.db, page_id).await?;
    require_page_role(&state.db, page_id, auth.user_id, MemberRole::Admin).await?;

    if page.kind != PageKind::Company {
        return Err(ApiError::BadRequest(
            "Company profiles are only available on company pages".to_string(),
        ));
    }

    let services = req
        .services
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let profile = CompanyProfile::upsert(
        &state.db,
        page_id,
        UpsertCompanyProfile {
            industry: req.industry,
            company_size: req.company_size,
            founded_year: req.founded_year,
            headquarters: req.headquarters,
            services,
            contact_email: req.contact_email,
        },
    )
    .await?;

    Ok(Json(profile))
}
