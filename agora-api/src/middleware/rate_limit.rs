/// Per-user rate limiting for mutation routes
///
/// Token bucket kept in Redis and updated by a Lua script, so concurrent API
/// instances share one bucket per user. Reads (`GET`, `HEAD`, `OPTIONS`) and
/// anonymous requests are never limited.
///
/// # Storage
///
/// Hash at `ratelimit:user:{user_id}` with fields `tokens` and `last_refill`
/// (unix seconds), expiring after two minutes of inactivity.
///
/// # Headers
///
/// - `X-RateLimit-Limit`: bucket capacity
/// - `X-RateLimit-Remaining`: tokens left after this request
/// - `Retry-After`: seconds to wait (429 responses only)
///
/// # Failure mode
///
/// Without Redis, or when Redis errors or times out, requests pass and a
/// warning is logged.

use crate::app::AppState;
use crate::config::RateLimitConfig;
use crate::error::ApiError;
use agora_shared::auth::middleware::AuthContext;
use agora_shared::redis::{RedisClient, RedisClientError};
use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use uuid::Uuid;

/// Bucket parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    /// Tokens added per second
    pub refill_rate: f64,

    /// Maximum tokens (burst size)
    pub bucket_capacity: u32,
}

impl RateLimit {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            refill_rate: config.requests_per_minute as f64 / 60.0,
            bucket_capacity: config.burst,
        }
    }
}

/// Outcome of one bucket check
#[derive(Debug, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,

    /// Seconds until a token is available (0 when allowed)
    pub retry_after: u64,
}

impl RateLimitResult {
    /// Parses the `{allowed, remaining, retry_after}` script reply
    fn from_reply(reply: &[i64]) -> Option<Self> {
        match reply {
            [allowed, remaining, retry_after] => Some(Self {
                allowed: *allowed == 1,
                remaining: (*remaining).max(0) as u32,
                retry_after: (*retry_after).max(0) as u64,
            }),
            _ => None,
        }
    }
}

const TOKEN_BUCKET_SCRIPT: &str = r#"
local key = KEYS[1]
local capacity = tonumber(ARGV[1])
local refill_rate = tonumber(ARGV[2])
local now = tonumber(ARGV[3])

local bucket = redis.call('HMGET', key, 'tokens', 'last_refill')
local tokens = tonumber(bucket[1])
local last_refill = tonumber(bucket[2])

if not tokens then
    tokens = capacity
    last_refill = now
end

local elapsed = math.max(0, now - last_refill)
tokens = math.min(capacity, tokens + (elapsed * refill_rate))

if tokens >= 1 then
    tokens = tokens - 1
    redis.call('HSET', key, 'tokens', tokens, 'last_refill', now)
    redis.call('EXPIRE', key, 120)
    return {1, math.floor(tokens), 0}
else
    redis.call('HSET', key, 'tokens', tokens, 'last_refill', now)
    redis.call('EXPIRE', key, 120)
    return {0, 0, math.ceil((1 - tokens) / refill_rate)}
end
"#;

fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Rate limiting middleware layer
///
/// Runs after session authentication so the `AuthContext` is available.
///
/// # Errors
///
/// - 429 Too Many Requests: bucket empty
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_read_only(request.method()) {
        return Ok(next.run(request).await);
    }

    let auth = request.extensions().get::<AuthContext>().copied();
    let (Some(redis), Some(auth)) = (state.redis.as_ref(), auth) else {
        return Ok(next.run(request).await);
    };

    let limit = RateLimit::from_config(&state.config.rate_limit);

    let result = match check_rate_limit(redis, auth.user_id, limit).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, user_id = %auth.user_id, "Rate limiter unavailable, allowing request");
            return Ok(next.run(request).await);
        }
    };

    if !result.allowed {
        debug!(user_id = %auth.user_id, retry_after = result.retry_after, "Rate limit exceeded");
        return Err(ApiError::RateLimitExceeded {
            retry_after: result.retry_after,
            message: format!(
                "Rate limit exceeded. Try again in {} seconds",
                result.retry_after
            ),
        });
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit.bucket_capacity));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(result.remaining));

    Ok(response)
}

/// Takes one token from the user's bucket
///
/// # Errors
///
/// Returns an error if Redis fails, times out or answers unexpectedly.
pub async fn check_rate_limit(
    redis: &RedisClient,
    user_id: Uuid,
    limit: RateLimit,
) -> Result<RateLimitResult, RedisClientError> {
    let key = format!("ratelimit:user:{}", user_id);
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let script = redis::Script::new(TOKEN_BUCKET_SCRIPT);
    let mut conn = redis.get_connection();

    let mut invocation = script.key(&key);
    invocation
        .arg(limit.bucket_capacity)
        .arg(limit.refill_rate)
        .arg(now);

    let reply: Vec<i64> = tokio::time::timeout(
        redis.command_timeout(),
        invocation.invoke_async(&mut conn),
    )
    .await
    .map_err(|_| RedisClientError::Timeout)??;

    RateLimitResult::from_reply(&reply).ok_or_else(|| {
        RedisClientError::CommandError(format!("Unexpected rate limit reply: {:?}", reply))
    })
}
