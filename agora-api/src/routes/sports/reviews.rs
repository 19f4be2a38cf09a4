/// Review endpoints
///
/// - `GET /v1/sports/academies/:id/reviews` / `GET /v1/sports/talents/:id/reviews`
/// - `POST /v1/sports/academies/:id/reviews` / `POST /v1/sports/talents/:id/reviews`
///   (auth, not on own listing, one per author)
/// - `PATCH /v1/reviews/:id` - Edit (author)
/// - `DELETE /v1/reviews/:id` - Remove (author)
///
/// Every write recomputes the listing's `average_rating` and `review_count`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, SuccessResponse},
    routes::Listing,
};
use agora_shared::auth::{authorization::require_ownership, middleware::AuthContext};
use agora_shared::models::review::{CreateReview, ListingKind, Review, ReviewView, UpdateReview};
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
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i16>,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

fn not_found(kind: ListingKind) -> ApiError {
    match kind {
        ListingKind::Academy => ApiError::NotFound("Academy not found".to_string()),
        ListingKind::Talent => ApiError::NotFound("Talent not found".to_string()),
    }
}

async fn list_reviews(
    state: &AppState,
    kind: ListingKind,
    listing_id: Uuid,
    page: Pagination,
) -> ApiResult<Json<Listing<ReviewView>>> {
    kind.find_owner(&state.db, listing_id)
        .await?
        .ok_or_else(|| not_found(kind))?;

    let reviews = Review::list_for_target(&state.db, kind, listing_id, page).await?;
    Ok(Listing::new(reviews, page))
}

/// Creates a review and refreshes the listing's rating
///
/// # Errors
///
/// - `400 Bad Request`: Reviewing your own listing
/// - `404 Not Found`: Listing does not exist
/// - `409 Conflict`: Caller already reviewed this listing
async fn create_review(
    state: &AppState,
    auth: &AuthContext,
    kind: ListingKind,
    listing_id: Uuid,
    req: CreateReviewRequest,
) -> ApiResult<(StatusCode, Json<Review>)> {
    req.validate()?;

    let owner = kind
        .find_owner(&state.db, listing_id)
        .await?
        .ok_or_else(|| not_found(kind))?;

    if owner.owner_id == auth.user_id {
        return Err(ApiError::BadRequest(
            "You cannot review your own listing".to_string(),
        ));
    }

    let review = Review::create(
        &state.db,
        kind,
        listing_id,
        auth.user_id,
        CreateReview {
            rating: req.rating,
            comment: req.comment,
        },
    )
    .await?;

    tracing::info!(
        user_id = %auth.user_id,
        target = kind.as_str(),
        target_id = %listing_id,
        rating = review.rating,
        "Review created"
    );

    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn list_academy_reviews(
    State(state): State<AppState>,
    Path(academy_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Listing<ReviewView>>> {
    list_reviews(&state, ListingKind::Academy, academy_id, page).await
}

pub async fn create_academy_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(academy_id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    create_review(&state, &auth, ListingKind::Academy, academy_id, req).await
}

pub async fn list_talent_reviews(
    State(state): State<AppState>,
    Path(talent_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Listing<ReviewView>>> {
    list_reviews(&state, ListingKind::Talent, talent_id, page).await
}

pub async fn create_talent_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(talent_id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    create_review(&state, &auth, ListingKind::Talent, talent_id, req).await
}

async fn authored_review(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Review> {
    let review = Review::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;
    require_ownership(auth, review.author_id)?;
    Ok(review)
}

pub async fn update_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(review_id): Path<Uuid>,
    Json(req): Json<UpdateReviewRequest>,
) -> ApiResult<Json<Review>> {
    req.validate()?;
    authored_review(&state, &auth, review_id).await?;

    Review::update(
        &state.db,
        review_id,
        UpdateReview {
            rating: req.rating,
            comment: req.comment,
        },
    )
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))
}

pub async fn delete_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(review_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    authored_review(&state, &auth, review_id).await?;

    if !Review::delete(&state.db, review_id).await? {
        return Err(ApiError::NotFound("Review not found".to_string()));
    }

    tracing::info!(user_id = %auth.user_id, review_id = %review_id, "Review deleted");

    Ok(SuccessResponse::new("Review deleted"))
}
