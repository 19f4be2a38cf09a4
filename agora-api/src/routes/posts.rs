/// Post endpoints
///
/// # Endpoints
///
/// - `GET /v1/pages/:id/posts` - Posts of a page, newest first
/// - `POST /v1/pages/:id/posts` - Publish (accepted member)
/// - `GET /v1/posts/:id` - Post with reaction counts
/// - `PATCH /v1/posts/:id` - Edit (author)
/// - `DELETE /v1/posts/:id` - Soft delete (author or page admin)
/// - `POST /v1/posts/:id/reactions` - Toggle like/dislike (auth)
/// - `GET /v1/feed` - Posts from the caller's pages (auth)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, SuccessResponse},
    routes::{load_page, Listing},
};
use agora_shared::auth::authorization::{
    require_author_or_page_role, require_ownership, require_page_role,
};
use agora_shared::auth::middleware::AuthContext;
use agora_shared::models::membership::MemberRole;
use agora_shared::models::post::{CreatePost, Post, PostView, UpdatePost};
use agora_shared::models::reaction::{self, ReactionKind, ToggleResult};
use agora_shared::models::Pagination;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

const MAX_MEDIA_PER_POST: usize = 10;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 10000, message = "Content must be 1-10000 characters"))]
    pub content: String,

    #[serde(default)]
    pub media_urls: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 10000, message = "Content must be 1-10000 characters"))]
    pub content: Option<String>,

    pub media_urls: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    pub kind: ReactionKind,
}

/// Post plus the viewer's own reaction
#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostView,

    pub my_reaction: Option<ReactionKind>,
}

/// Media URLs must be absolute http(s) URLs, at most ten per post
fn check_media_urls(urls: &[String]) -> ApiResult<()> {
    if urls.len() > MAX_MEDIA_PER_POST {
        return Err(ApiError::invalid("media_urls", "At most 10 media items per post"));
    }

    if urls
        .iter()
        .any(|u| !(u.starts_with("https://") || u.starts_with("http://")))
    {
        return Err(ApiError::invalid("media_urls", "Media URLs must be http(s) URLs"));
    }

    Ok(())
}

pub async fn list_page_posts(
    State(state): State<AppState>,
    Path(page_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Listing<PostView>>> {
    load_page(&state.db, page_id).await?;

    let posts = Post::list_for_page(&state.db, page_id, page).await?;
    Ok(Listing::new(posts, page))
}

/// Publishes a post on a page
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an accepted member
/// - `404 Not Found`: Page does not exist
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(page_id): Path<Uuid>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    req.validate()?;
    check_media_urls(&req.media_urls)?;

    load_page(&state.db, page_id).await?;
    require_page_role(&state.db, page_id, auth.user_id, MemberRole::Member).await?;

    let post = Post::create(
        &state.db,
        page_id,
        auth.user_id,
        CreatePost {
            content: req.content,
            media_urls: req.media_urls,
        },
    )
    .await?;

    tracing::info!(user_id = %auth.user_id, page_id = %page_id, post_id = %post.id, "Post created");

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<PostDetail>> {
    let post = Post::find_view(&state.db, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    let my_reaction = match auth {
        Some(auth) => {
            reaction::counts(&state.db, post_id, Some(auth.user_id))
                .await?
                .my_reaction
        }
        None => None,
    };

    Ok(Json(PostDetail { post, my_reaction }))
}

pub async fn update_post(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(post_id): Path<Uuid>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<Json<Post>> {
    req.validate()?;
    if let Some(urls) = &req.media_urls {
        check_media_urls(urls)?;
    }

    let post = Post::find_by_id(&state.db, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
    require_ownership(&auth, post.author_id)?;

    let post = Post::update(
        &state.db,
        post_id,
        UpdatePost {
            content: req.content,
            media_urls: req.media_urls,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    let post = Post::find_by_id(&state.db, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    require_author_or_page_role(&state.db, &auth, post.author_id, post.page_id, MemberRole::Admin)
        .await?;

    Post::deactivate(&state.db, post_id).await?;

    tracing::info!(user_id = %auth.user_id, post_id = %post_id, "Post deleted");

    Ok(SuccessResponse::new("Post deleted"))
}

/// Toggles the caller's reaction
///
/// No reaction adds one, the same kind removes it, the other kind switches.
///
/// # Response
///
/// ```json
/// { "outcome": "switched", "likes": 3, "dislikes": 1, "my_reaction": "dislike" }
/// ```
pub async fn react(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(post_id): Path<Uuid>,
    Json(req): Json<ReactRequest>,
) -> ApiResult<Json<ToggleResult>> {
    Post::find_by_id(&state.db, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    let result = reaction::toggle(&state.db, post_id, auth.user_id, req.kind).await?;

    tracing::debug!(
        user_id = %auth.user_id,
        post_id = %post_id,
        outcome = ?result.outcome,
        "Reaction toggled"
    );

    Ok(Json(result))
}

pub async fn feed(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Listing<PostView>>> {
    let posts = Post::feed(&state.db, auth.user_id, page).await?;
    Ok(Listing::new(posts, page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_url_checks() {
        assert!(check_media_urls(&[]).is_ok());
        assert!(check_media_urls(&["https://cdn.example.com/a.png".to_string()]).is_ok());
        assert!(check_media_urls(&["javascript:alert(1)".to_string()]).is_err());

        let too_many: Vec<String> = (0..11)
            .map(|i| format!("https://cdn.example.com/{}.png", i))
            .collect();
        assert!(check_media_urls(&too_many).is_err());
    }

    #[test]
    fn test_react_request() {
        let req: ReactRequest = serde_json::from_value(serde_json::json!({ "kind": "dislike" })).unwrap();
        assert_eq!(req.kind, ReactionKind::Dislike);
        assert!(serde_json::from_value::<ReactRequest>(serde_json::json!({ "kind": "love" })).is_err());
    }
}
