/// Page membership model and database operations
///
/// Users request to join a page; page admins accept or reject the request.
/// Only *accepted* memberships carry a role for authorization purposes.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('owner', 'admin', 'member');
///
/// CREATE TABLE page_members (
///     page_id UUID NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'member',
///     status request_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (page_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: Created the page; can delete it; cannot leave
/// - **admin**: Edits the page, moderates members, posts and contributions
/// - **member**: Publishes posts
///
/// # Example
///
/// ```no_run
/// use agora_shared::models::membership::{Membership, MemberRole};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, page_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// Membership::request_join(&pool, page_id, user_id).await?;
///
/// // Still pending, so no role yet
/// assert_eq!(Membership::get_role(&pool, page_id, user_id).await?, None);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Pagination, RequestStatus};

/// Role within a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }

    /// Checks if this role meets the required role
    ///
    /// Hierarchy: Owner > Admin > Member
    pub fn has_permission(&self, required: &MemberRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            MemberRole::Owner => 3,
            MemberRole::Admin => 2,
            MemberRole::Member => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub page_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership joined with the member's public profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberListing {
    pub user_id: Uuid,
    pub username: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: MemberRole,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    /// Creates a pending membership request
    ///
    /// # Errors
    ///
    /// An existing membership (in any state) surfaces as a unique violation
    /// on `page_members_pkey`.
    pub async fn request_join(pool: &PgPool, page_id: Uuid, user_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO page_members (page_id, user_id, role, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(page_id)
        .bind(user_id)
        .bind(MemberRole::Member)
        .bind(RequestStatus::Pending)
        .fetch_one(pool)
        .await
    }

    pub async fn find(pool: &PgPool, page_id: Uuid, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            "SELECT * FROM page_members WHERE page_id = $1 AND user_id = $2",
        )
        .bind(page_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Role of an accepted member, `None` otherwise
    pub async fn get_role(pool: &PgPool, page_id: Uuid, user_id: Uuid) -> Result<Option<MemberRole>, sqlx::Error> {
        sqlx::query_scalar::<_, MemberRole>(
            "SELECT role FROM page_members WHERE page_id = $1 AND user_id = $2 AND status = $3",
        )
        .bind(page_id)
        .bind(user_id)
        .bind(RequestStatus::Accepted)
        .fetch_optional(pool)
        .await
    }

    /// Members of a page in the given state, oldest first
    pub async fn list(
        pool: &PgPool,
        page_id: Uuid,
        status: RequestStatus,
        page: Pagination,
    ) -> Result<Vec<MemberListing>, sqlx::Error> {
        sqlx::query_as::<_, MemberListing>(
            r#"
            SELECT m.user_id, u.username, u.name, u.avatar_url, m.role, m.status, m.created_at
            FROM page_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.page_id = $1 AND m.status = $2 AND u.is_active = TRUE
            ORDER BY m.created_at
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(page_id)
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    /// Resolves a pending request
    ///
    /// Returns `None` if there is no *pending* request for this user, so a
    /// request cannot be decided twice.
    pub async fn decide(
        pool: &PgPool,
        page_id: Uuid,
        user_id: Uuid,
        status: RequestStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            r#"
            UPDATE page_members
            SET status = $3, updated_at = NOW()
            WHERE page_id = $1 AND user_id = $2 AND status = $4
            RETURNING *
            "#,
        )
        .bind(page_id)
        .bind(user_id)
        .bind(status)
        .bind(RequestStatus::Pending)
        .fetch_optional(pool)
        .await
    }

    /// Changes the role of an accepted, non-owner member
    ///
    /// Returns `None` when there is no such membership. The owner row is
    /// never touched and ownership cannot be granted here.
    pub async fn set_role(
        pool: &PgPool,
        page_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        if role == MemberRole::Owner {
            return Ok(None);
        }

        sqlx::query_as::<_, Membership>(
            r#"
            UPDATE page_members
            SET role = $3, updated_at = NOW()
            WHERE page_id = $1 AND user_id = $2 AND status = $4 AND role <> $5
            RETURNING *
            "#,
        )
        .bind(page_id)
        .bind(user_id)
        .bind(role)
        .bind(RequestStatus::Accepted)
        .bind(MemberRole::Owner)
        .fetch_optional(pool)
        .await
    }

    /// Removes a non-owner membership
    ///
    /// Returns `false` when there was nothing to remove or the user is the
    /// owner.
    pub async fn leave(pool: &PgPool, page_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM page_members WHERE page_id = $1 AND user_id = $2 AND role <> $3",
        )
        .bind(page_id)
        .bind(user_id)
        .bind(MemberRole::Owner)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
