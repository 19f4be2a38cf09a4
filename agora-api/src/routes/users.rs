/// User profile endpoints
///
/// # Endpoints
///
/// - `GET /v1/users/me` - Own account (auth)
/// - `PATCH /v1/users/me` - Update own profile (auth)
/// - `DELETE /v1/users/me` - Deactivate own account (auth)
/// - `GET /v1/users/:username` - Public profile

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, SuccessResponse},
    routes::load_user,
};
use agora_shared::auth::middleware::AuthContext;
use agora_shared::models::user::{PublicProfile, UpdateUser, User};
use agora_shared::slug::slugify;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

/// Profile update; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 3, max = 40, message = "Username must be 3-40 characters"))]
    pub username: Option<String>,

    #[validate(length(max = 2000, message = "Bio must be at most 2000 characters"))]
    pub bio: Option<String>,

    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
}

pub async fn get_me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<User>> {
    Ok(Json(load_user(&state.db, auth.user_id).await?))
}

/// Updates the caller's profile
///
/// # Errors
///
/// - `409 Conflict`: Username already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    if let Some(username) = &req.username {
        if slugify(username) != *username {
            return Err(ApiError::invalid(
                "username",
                "Username may only contain lowercase letters, digits and dashes",
            ));
        }
    }

    let user = User::update(
        &state.db,
        auth.user_id,
        UpdateUser {
            name: req.name,
            username: req.username,
            bio: req.bio,
            avatar_url: req.avatar_url,
            location: req.location,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(user))
}

/// Deactivates the caller's account
///
/// The row is kept; later sessions for the same subject are rejected with
/// `403`.
pub async fn delete_me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<SuccessResponse>> {
    if !User::deactivate(&state.db, auth.user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %auth.user_id, "Account deactivated");

    Ok(SuccessResponse::new("Account deactivated"))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<PublicProfile>> {
    let user = User::find_by_username(&state.db, &username.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_profile_validation() {
        let req: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "name": "",
            "avatar_url": "not a url"
        }))
        .unwrap();

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("avatar_url"));
    }

    #[test]
    fn test_empty_update_is_valid() {
        let req: UpdateProfileRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(req.validate().is_ok());
    }
}
