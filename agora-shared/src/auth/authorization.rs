/// Authorization helpers and permission checks
///
/// # Permission Model
///
/// 1. **Page roles**: `owner > admin > member`, held through *accepted*
///    memberships only
/// 2. **Ownership**: academies and talents belong to their creator; posts and
///    reviews to their author
/// 3. **Platform admin**: `users.is_admin`, manages sport categories
///
/// # Example
///
/// ```no_run
/// use agora_shared::auth::authorization::{require_ownership, require_page_role};
/// use agora_shared::auth::middleware::AuthContext;
/// use agora_shared::models::membership::MemberRole;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, auth: AuthContext, page_id: Uuid, author_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// // Page admins and owners only
/// require_page_role(&pool, page_id, auth.user_id, MemberRole::Admin).await?;
///
/// // Only the author
/// require_ownership(&auth, author_id)?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::membership::{MemberRole, Membership};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// No accepted membership on the page
    #[error("Not a member of page {0}")]
    NotMember(Uuid),

    /// Membership role below the required one
    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole {
        required: MemberRole,
        actual: MemberRole,
    },

    /// Caller is not the owner/author of the resource
    #[error("Not authorized to access this resource")]
    NotAuthorized,

    /// Caller is not a platform administrator
    #[error("Administrator access required")]
    AdminRequired,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Checks the caller holds at least `required` on the page
///
/// # Errors
///
/// - [`AuthzError::NotMember`] without an accepted membership
/// - [`AuthzError::InsufficientRole`] when the role is too low
pub async fn require_page_role(
    pool: &PgPool,
    page_id: Uuid,
    user_id: Uuid,
    required: MemberRole,
) -> Result<MemberRole, AuthzError> {
    let role = Membership::get_role(pool, page_id, user_id)
        .await?
        .ok_or(AuthzError::NotMember(page_id))?;

    if !role.has_permission(&required) {
        return Err(AuthzError::InsufficientRole {
            required,
            actual: role,
        });
    }

    Ok(role)
}

/// Checks the caller owns (or authored) the resource
pub fn require_ownership(auth: &AuthContext, resource_owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id != resource_owner_id {
        return Err(AuthzError::NotAuthorized);
    }

    Ok(())
}

/// Checks the caller is a platform administrator
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if !auth.is_admin {
        return Err(AuthzError::AdminRequired);
    }

    Ok(())
}

/// Allows the author, or a page member holding `required`
///
/// Used for moderation: a post can be removed by its author or by a page
/// admin.
pub async fn require_author_or_page_role(
    pool: &PgPool,
    auth: &AuthContext,
    author_id: Uuid,
    page_id: Uuid,
    required: MemberRole,
) -> Result<(), AuthzError> {
    if auth.user_id == author_id {
        return Ok(());
    }

    require_page_role(pool, page_id, auth.user_id, required).await?;
    Ok(())
}
