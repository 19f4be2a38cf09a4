/// Session tokens issued by the authentication provider
///
/// The provider signs an HS256 token after login and the browser carries it in
/// the `agora_session` cookie. The API only validates it; user records are
/// synchronised from the claims on each authenticated request.
///
/// # Validation
///
/// - Signature (HS256, shared secret)
/// - `exp` and `nbf`
/// - `iss` must equal the configured provider issuer
///
/// # Example
///
/// ```
/// use agora_shared::auth::session::{create_session_token, validate_session_token, SessionClaims};
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-shared-secret-of-at-least-32-bytes!";
/// let claims = SessionClaims::new("provider|42", "ana@example.com", "https://auth.example.com", Duration::hours(1));
/// let token = create_session_token(&claims, secret)?;
///
/// let validated = validate_session_token(&token, secret, "https://auth.example.com")?;
/// assert_eq!(validated.sub, "provider|42");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Cookie that carries the session token
pub const SESSION_COOKIE: &str = "agora_session";

/// Error type for session token operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No token in cookie or header
    #[error("Missing session token")]
    Missing,

    /// Token could not be signed
    #[error("Failed to create session token: {0}")]
    CreateError(String),

    /// Token is past its `exp`
    #[error("Session has expired")]
    Expired,

    /// Token was issued by someone else
    #[error("Invalid session issuer")]
    InvalidIssuer,

    /// Anything else: bad signature, malformed token, `nbf` in the future
    #[error("Invalid session token: {0}")]
    Invalid(String),
}

/// Claims carried by a provider session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Provider subject, stable per account
    pub sub: String,

    /// Verified email address
    pub email: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
}

impl SessionClaims {
    /// Claims valid from now for `expires_in`
    pub fn new(
        sub: impl Into<String>,
        email: impl Into<String>,
        issuer: impl Into<String>,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: sub.into(),
            email: email.into(),
            name: None,
            picture: None,
            iss: issuer.into(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Sets the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the avatar URL
    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims with HS256
///
/// Production tokens come from the provider; this exists for local tooling
/// and tests.
pub fn create_session_token(claims: &SessionClaims, secret: &str) -> Result<String, SessionError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| SessionError::CreateError(e.to_string()))
}

/// Validates a session token and returns its claims
///
/// # Errors
///
/// - [`SessionError::Expired`] when `exp` has passed
/// - [`SessionError::InvalidIssuer`] when `iss` is not `issuer`
/// - [`SessionError::Invalid`] for bad signatures, malformed tokens or an
///   `nbf` in the future
pub fn validate_session_token(
    token: &str,
    secret: &str,
    issuer: &str,
) -> Result<SessionClaims, SessionError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => SessionError::Expired,
            ErrorKind::InvalidIssuer => SessionError::InvalidIssuer,
            _ => SessionError::Invalid(e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-session-secret-at-least-32-bytes";
    const ISSUER: &str = "https://auth.agora.test";

    fn claims(expires_in: Duration) -> SessionClaims {
        SessionClaims::new("provider|abc", "ana@example.com", ISSUER, expires_in)
    }

    #[test]
    fn test_create_and_validate() {
        let original = claims(Duration::hours(1))
            .with_name("Ana Pérez")
            .with_picture("https://cdn.example.com/ana.png");
        let token = create_session_token(&original, SECRET).unwrap();

        let validated = validate_session_token(&token, SECRET, ISSUER).unwrap();
        assert_eq!(validated, original);
        assert!(!validated.is_expired());
    }

    #[test]
    fn test_wrong_secret() {
        let token = create_session_token(&claims(Duration::hours(1)), SECRET).unwrap();
        let result = validate_session_token(&token, "another-secret-of-at-least-32-bytes", ISSUER);
        assert!(matches!(result, Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_expired() {
        let expired = claims(Duration::seconds(-3600));
        assert!(expired.is_expired());

        let token = create_session_token(&expired, SECRET).unwrap();
        let result = validate_session_token(&token, SECRET, ISSUER);
        assert!(matches!(result, Err(SessionError::Expired)));
    }

    #[test]
    fn test_wrong_issuer() {
        let token = create_session_token(&claims(Duration::hours(1)), SECRET).unwrap();
        let result = validate_session_token(&token, SECRET, "https://evil.example.com");
        assert!(matches!(result, Err(SessionError::InvalidIssuer)));
    }

    #[test]
    fn test_not_yet_valid() {
        let mut future = claims(Duration::hours(2));
        future.nbf = (Utc::now() + Duration::hours(1)).timestamp();

        let token = create_session_token(&future, SECRET).unwrap();
        assert!(validate_session_token(&token, SECRET, ISSUER).is_err());
    }

    #[test]
    fn test_garbage_token() {
        let result = validate_session_token("not.a.token", SECRET, ISSUER);
        assert!(matches!(result, Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_optional_claims_omitted() {
        let token = create_session_token(&claims(Duration::hours(1)), SECRET).unwrap();
        let validated = validate_session_token(&token, SECRET, ISSUER).unwrap();
        assert!(validated.name.is_none());
        assert!(validated.picture.is_none());
    }
}
