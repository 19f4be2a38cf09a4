/// User model and database operations
///
/// Accounts are owned by the external authentication provider. A local row is
/// created the first time a session is seen and refreshed on later requests;
/// `auth_subject` links the two.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     auth_subject VARCHAR(255) NOT NULL,      -- unique
///     email VARCHAR(320) NOT NULL,             -- unique on LOWER(email)
///     name VARCHAR(255),
///     username VARCHAR(80) NOT NULL,           -- unique
///     bio TEXT,
///     avatar_url VARCHAR(1024),
///     location VARCHAR(255),
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_seen_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::session::SessionClaims;
use crate::db::is_unique_violation;
use crate::slug;

const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Local user account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Provider subject; never exposed
    #[serde(skip_serializing)]
    pub auth_subject: String,

    pub email: String,
    pub name: Option<String>,

    /// Public handle used in profile URLs
    pub username: String,

    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,

    /// Platform administrator (manages sport categories)
    pub is_admin: bool,

    /// False once the account has been deactivated
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

/// Profile fields visible to other users
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: Option<String>,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            bio: user.bio,
            avatar_url: user.avatar_url,
            location: user.location,
            created_at: user.created_at,
        }
    }
}

/// Profile changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
}

impl User {
    /// Finds or creates the local user for a provider session
    ///
    /// Existing users get `last_seen_at` bumped and any empty name/avatar
    /// filled from the claims. New users receive a username derived from
    /// their email; a clash is retried with a random suffix.
    ///
    /// Deactivated users are returned as-is so the caller can reject them.
    ///
    /// # Errors
    ///
    /// Returns an error if the email already belongs to another subject or
    /// the database is unreachable.
    pub async fn sync_from_session(pool: &PgPool, claims: &SessionClaims) -> Result<Self, sqlx::Error> {
        let existing = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET last_seen_at = NOW(),
                name = COALESCE(name, $2),
                avatar_url = COALESCE(avatar_url, $3)
            WHERE auth_subject = $1
            RETURNING *
            "#,
        )
        .bind(&claims.sub)
        .bind(&claims.name)
        .bind(&claims.picture)
        .fetch_optional(pool)
        .await?;

        if let Some(user) = existing {
            return Ok(user);
        }

        let local_part = claims.email.split('@').next().unwrap_or_default();
        let base = slug::slugify(local_part);
        let mut attempt = 0;

        loop {
            let username = slug::candidate(&base, attempt);

            let result = sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (auth_subject, email, name, username, avatar_url, last_seen_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                ON CONFLICT (auth_subject) DO UPDATE SET last_seen_at = NOW()
                RETURNING *
                "#,
            )
            .bind(&claims.sub)
            .bind(&claims.email)
            .bind(&claims.name)
            .bind(&username)
            .bind(&claims.picture)
            .fetch_one(pool)
            .await;

            match result {
                Ok(user) => {
                    info!(user_id = %user.id, username = %user.username, "Created local user from session");
                    return Ok(user);
                }
                Err(e)
                    if is_unique_violation(&e, USERNAME_CONSTRAINT)
                        && attempt + 1 < slug::MAX_SLUG_ATTEMPTS =>
                {
                    debug!(%username, "Username taken, retrying with suffix");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active user by username
    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1 AND is_active = TRUE")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Applies profile changes
    ///
    /// Returns `None` when the user does not exist or is deactivated. A taken
    /// username surfaces as a unique violation on `users_username_key`.
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateUser) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                username = COALESCE($3, username),
                bio = COALESCE($4, bio),
                avatar_url = COALESCE($5, avatar_url),
                location = COALESCE($6, location),
                updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.username)
        .bind(data.bio)
        .bind(data.avatar_url)
        .bind(data.location)
        .fetch_optional(pool)
        .await
    }

    /// Soft-deletes the account
    ///
    /// Returns `false` if the user was already inactive.
    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            auth_subject: "provider|1".to_string(),
            email: "ana@example.com".to_string(),
            name: Some("Ana".to_string()),
            username: "ana".to_string(),
            bio: None,
            avatar_url: None,
            location: Some("Lisbon".to_string()),
            is_admin: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_seen_at: None,
        }
    }

    #[test]
    fn test_auth_subject_not_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("auth_subject").is_none());
        assert_eq!(json["username"], "ana");
    }

    #[test]
    fn test_public_profile_hides_email() {
        let profile = PublicProfile::from(sample_user());
        let json = serde_json::to_value(profile).unwrap();
        assert!(json.get("email").is_none());
        assert!(json.get("is_admin").is_none());
        assert_eq!(json["location"], "Lisbon");
    }
}
