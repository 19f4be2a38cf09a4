/// Middleware modules for the API server
///
/// - `security`: OWASP response headers
/// - `rate_limit`: Redis token bucket on mutation routes
///
/// Session authentication lives in `agora_shared::auth::middleware`.

pub mod rate_limit;
pub mod security;
