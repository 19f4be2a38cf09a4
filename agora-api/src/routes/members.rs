/// Page membership endpoints
///
/// Joining is a request a page admin accepts or rejects. Only accepted
/// memberships grant a role.
///
/// # Endpoints
///
/// - `POST /v1/pages/:id/join` - Request membership (auth)
/// - `GET /v1/pages/:id/members?status=` - Members; non-accepted lists need page admin
/// - `POST /v1/pages/:id/members/:user_id/accept` - Accept request (page admin)
/// - `POST /v1/pages/:id/members/:user_id/reject` - Reject request (page admin)
/// - `PATCH /v1/pages/:id/members/:user_id` - Set a member's role (page owner)
/// - `DELETE /v1/pages/:id/members/me` - Leave the page (auth, not owner)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, SuccessResponse},
    routes::{load_page, notification_recipient, Listing},
};
use agora_shared::auth::{authorization::require_page_role, middleware::AuthContext};
use agora_shared::models::membership::{MemberListing, MemberRole, Membership};
use agora_shared::models::{Pagination, RequestStatus};
use agora_shared::notifications::Notification;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: MemberRole,
}

#[derive(Debug, Default, Deserialize)]
pub struct MemberQuery {
    /// Defaults to `accepted`
    pub status: Option<RequestStatus>,
}

/// Requests membership of a page
///
/// A previously rejected request may be renewed; any other existing
/// membership is a conflict.
///
/// # Errors
///
/// - `404 Not Found`: Page does not exist
/// - `409 Conflict`: Already a member or request pending
pub async fn join_page(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(page_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    load_page(&state.db, page_id).await?;

    if let Some(existing) = Membership::find(&state.db, page_id, auth.user_id).await? {
        match existing.status {
            RequestStatus::Rejected => {
                Membership::leave(&state.db, page_id, auth.user_id).await?;
            }
            RequestStatus::Pending => {
                return Err(ApiError::Conflict("Your membership request is pending".to_string()));
            }
            RequestStatus::Accepted => {
                return Err(ApiError::Conflict("You are already a member of this page".to_string()));
            }
        }
    }

    let membership = Membership::request_join(&state.db, page_id, auth.user_id).await?;

    tracing::info!(user_id = %auth.user_id, page_id = %page_id, "Membership requested");

    Ok((StatusCode::CREATED, Json(membership)))
}

pub async fn list_members(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Path(page_id): Path<Uuid>,
    Query(query): Query<MemberQuery>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Listing<MemberListing>>> {
    load_page(&state.db, page_id).await?;

    let status = query.status.unwrap_or(RequestStatus::Accepted);
    if status != RequestStatus::Accepted {
        let auth = auth.ok_or_else(|| ApiError::Unauthorized("Session required".to_string()))?;
        require_page_role(&state.db, page_id, auth.user_id, MemberRole::Admin).await?;
    }

    let members = Membership::list(&state.db, page_id, status, page).await?;
    Ok(Listing::new(members, page))
}

pub async fn accept_member(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((page_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Membership>> {
    decide(&state, auth, page_id, user_id, RequestStatus::Accepted).await
}

pub async fn reject_member(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((page_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Membership>> {
    decide(&state, auth, page_id, user_id, RequestStatus::Rejected).await
}

async fn decide(
    state: &AppState,
    auth: AuthContext,
    page_id: Uuid,
    user_id: Uuid,
    status: RequestStatus,
) -> ApiResult<Json<Membership>> {
    let page = load_page(&state.db, page_id).await?;
    require_page_role(&state.db, page_id, auth.user_id, MemberRole::Admin).await?;

    let membership = Membership::decide(&state.db, page_id, user_id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("No pending membership request".to_string()))?;

    tracing::info!(
        page_id = %page_id,
        user_id = %user_id,
        decided_by = %auth.user_id,
        status = status.as_str(),
        "Membership request decided"
    );

    if status == RequestStatus::Accepted {
        if let Some(member) = notification_recipient(&state.db, user_id).await {
            state
                .notifier
                .notify(Notification::MembershipAccepted {
                    to: member.email,
                    page_name: page.name,
                    page_slug: page.slug,
                })
                .await;
        }
    }

    Ok(Json(membership))
}

/// Promotes a member to admin or demotes an admin to member
///
/// # Errors
///
/// - `400 Bad Request`: Assigning `owner`, or changing the owner's role
/// - `403 Forbidden`: Caller is not the page owner
/// - `404 Not Found`: No accepted membership for this user
pub async fn update_member_role(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((page_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<Membership>> {
    let page = load_page(&state.db, page_id).await?;
    require_page_role(&state.db, page_id, auth.user_id, MemberRole::Owner).await?;
    check_assignable(req.role, page.owner_id, user_id)?;

    let membership = Membership::set_role(&state.db, page_id, user_id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("No accepted membership for this user".to_string()))?;

    tracing::info!(
        page_id = %page_id,
        user_id = %user_id,
        role = req.role.as_str(),
        changed_by = %auth.user_id,
        "Member role changed"
    );

    Ok(Json(membership))
}

fn check_assignable(role: MemberRole, owner_id: Uuid, user_id: Uuid) -> ApiResult<()> {
    if role == MemberRole::Owner {
        return Err(ApiError::BadRequest("Ownership cannot be assigned".to_string()));
    }
    if user_id == owner_id {
        return Err(ApiError::BadRequest("The page owner's role cannot change".to_string()));
    }
    Ok(())
}

/// Leaves a page
///
/// # Errors
///
/// - `400 Bad Request`: The owner cannot leave
/// - `404 Not Found`: No membership
pub async fn leave_page(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(page_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    let membership = Membership::find(&state.db, page_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("You are not a member of this page".to_string()))?;

    if membership.role == MemberRole::Owner {
        return Err(ApiError::BadRequest("The page owner cannot leave the page".to_string()));
    }

    Membership::leave(&state.db, page_id, auth.user_id).await?;

    tracing::info!(user_id = %auth.user_id, page_id = %page_id, "Left page");

    Ok(SuccessResponse::new("Left page"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_query_status() {
        let query: MemberQuery = serde_json::from_value(serde_json::json!({ "status": "pending" })).unwrap();
        assert_eq!(query.status, Some(RequestStatus::Pending));

        let query = MemberQuery::default();
        assert_eq!(query.status.unwrap_or(RequestStatus::Accepted), RequestStatus::Accepted);
    }

    #[test]
    fn test_role_assignment_rules() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();

        assert!(check_assignable(MemberRole::Admin, owner, member).is_ok());
        assert!(check_assignable(MemberRole::Member, owner, member).is_ok());
        assert!(matches!(
            check_assignable(MemberRole::Owner, owner, member),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            check_assignable(MemberRole::Member, owner, owner),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_update_role_request() {
        let req: UpdateRoleRequest = serde_json::from_value(serde_json::json!({ "role": "admin" })).unwrap();
        assert_eq!(req.role, MemberRole::Admin);
    }
}
