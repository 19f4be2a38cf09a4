/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "redis": "disabled"
/// }
/// ```
///
/// `status` is `degraded` when the database is unreachable or a configured
/// Redis does not answer.

use crate::{app::AppState, error::ApiResult};
use agora_shared::db::pool::health_check as db_health_check;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,

    /// `connected`, `disconnected` or `disabled`
    pub redis: String,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database_ok = db_health_check(&state.db).await.is_ok();

    let redis_status = match &state.redis {
        Some(redis) => {
            if redis.ping().await.unwrap_or(false) {
                "connected"
            } else {
                "disconnected"
            }
        }
        None => "disabled",
    };

    let healthy = database_ok && redis_status != "disconnected";

    Ok(Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_ok { "connected" } else { "disconnected" }.to_string(),
        redis: redis_status.to_string(),
    }))
}
