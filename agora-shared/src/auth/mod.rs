/// Authentication and authorization
///
/// Authentication is delegated to an external provider; this module only
/// verifies its session tokens and maps them to local users.
///
/// # Modules
///
/// - [`session`]: Provider session token validation (HS256)
/// - [`middleware`]: Axum middleware and the `AuthContext` extractor
/// - [`authorization`]: Page roles, ownership and admin checks
///
/// # Example
///
/// ```
/// use agora_shared::auth::session::{create_session_token, validate_session_token, SessionClaims};
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let issuer = "https://auth.example.com";
/// let claims = SessionClaims::new("provider|7", "kofi@example.com", issuer, Duration::minutes(30));
/// let token = create_session_token(&claims, "secret-key-at-least-32-bytes-long")?;
/// assert!(validate_session_token(&token, "secret-key-at-least-32-bytes-long", issuer).is_ok());
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod middleware;
pub mod session;
