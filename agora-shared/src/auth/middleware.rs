/// Session authentication middleware for Axum
///
/// Reads the provider session from the `agora_session` cookie (or an
/// `Authorization: Bearer` header for API clients), validates it, resolves
/// the local user and stores an [`AuthContext`] in the request extensions.
///
/// Two variants are provided:
///
/// - [`session_auth_middleware`]: rejects requests without a valid session
/// - [`optional_session_middleware`]: attaches the context when a valid
///   session is present and lets anonymous requests through
///
/// # Example
///
/// ```no_run
/// use agora_shared::auth::middleware::{session_auth_middleware, AuthContext, SessionAuth};
/// use axum::{middleware, routing::get, Router};
/// use sqlx::PgPool;
///
/// async fn me(auth: AuthContext) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
///
/// # fn example(pool: PgPool) -> Router {
/// let auth = SessionAuth::new(pool, "session-secret-of-at-least-32-bytes", "https://auth.example.com");
///
/// Router::new()
///     .route("/me", get(me))
///     .layer(middleware::from_fn_with_state(auth, session_auth_middleware))
/// # }
/// ```

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::session::{validate_session_token, SessionError, SESSION_COOKIE};
use crate::models::user::User;

/// Authenticated caller, available to handlers as an extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Local user id
    pub user_id: Uuid,

    /// Platform administrator flag
    pub is_admin: bool,
}

impl AuthContext {
    pub fn new(user_id: Uuid, is_admin: bool) -> Self {
        Self { user_id, is_admin }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::Session(SessionError::Missing))
    }
}

/// Error type for authentication middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing or invalid session
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Valid session for a deactivated account
    #[error("Account is deactivated")]
    Deactivated,

    /// Database error while resolving the user
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Session(_) => StatusCode::UNAUTHORIZED,
            AuthError::Deactivated => StatusCode::FORBIDDEN,
            AuthError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = match &self {
            AuthError::Session(e) => ("unauthorized", e.to_string()),
            AuthError::Deactivated => ("forbidden", self.to_string()),
            AuthError::Database(e) => {
                error!(error = %e, "Database error during authentication");
                ("internal_error", "An internal error occurred".to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Settings and pool needed to authenticate a request
#[derive(Clone)]
pub struct SessionAuth {
    pool: PgPool,
    secret: Arc<str>,
    issuer: Arc<str>,
}

impl SessionAuth {
    pub fn new(pool: PgPool, secret: impl AsRef<str>, issuer: impl AsRef<str>) -> Self {
        Self {
            pool,
            secret: Arc::from(secret.as_ref()),
            issuer: Arc::from(issuer.as_ref()),
        }
    }

    /// Validates the session in `headers` and resolves the local user
    ///
    /// # Errors
    ///
    /// - [`AuthError::Session`] for a missing, expired or forged session
    /// - [`AuthError::Deactivated`] when the account has been deactivated
    /// - [`AuthError::Database`] when the user lookup fails
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let token = extract_session_token(headers).ok_or(SessionError::Missing)?;
        let claims = validate_session_token(&token, &self.secret, &self.issuer)?;

        let user = User::sync_from_session(&self.pool, &claims).await?;
        if !user.is_active {
            warn!(user_id = %user.id, "Rejected session for deactivated user");
            return Err(AuthError::Deactivated);
        }

        Ok(AuthContext::new(user.id, user.is_admin))
    }
}

/// Session token from the cookie, falling back to a Bearer header
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Requires a valid session
pub async fn session_auth_middleware(
    State(auth): State<SessionAuth>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = auth.authenticate(req.headers()).await?;
    debug!(user_id = %context.user_id, "Request authenticated");

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

/// Attaches the session when valid; anonymous and invalid sessions pass
///
/// A deactivated account is still rejected, and database errors still fail
/// the request.
pub async fn optional_session_middleware(
    State(auth): State<SessionAuth>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    match auth.authenticate(req.headers()).await {
        Ok(context) => {
            req.extensions_mut().insert(context);
        }
        Err(AuthError::Session(e)) => {
            if !matches!(e, SessionError::Missing) {
                debug!(error = %e, "Ignoring invalid session on public route");
            }
        }
        Err(e) => return Err(e),
    }

    Ok(next.run(req).await)
}
