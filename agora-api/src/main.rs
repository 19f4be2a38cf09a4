//! # Agora API Server
//!
//! HTTP API for the Agora community and sports marketplace: profiles, pages,
//! posts, the sports marketplace, inquiries and chat, contributions and
//! media uploads.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p agora-api
//! ```

use agora_api::{
    app::{build_router, AppState},
    config::Config,
};
use agora_shared::db::migrations::run_migrations;
use agora_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use agora_shared::integrations::media::{DisabledMediaStore, HostedMediaStore, MediaStore};
use agora_shared::redis::{RedisClient, RedisConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora_api=debug,agora_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Agora API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::from_url(&config.database.url)
    })
    .await?;
    run_migrations(&pool).await?;

    let redis = match &config.redis.url {
        Some(url) => match RedisClient::new(RedisConfig::new(url.clone())).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, rate limiting disabled");
                None
            }
        },
        None => {
            tracing::info!("REDIS_URL not set, rate limiting disabled");
            None
        }
    };

    let media: Arc<dyn MediaStore> = match config.media.hosted() {
        Some(hosted) => Arc::new(HostedMediaStore::new(hosted)?),
        None => {
            tracing::warn!("Media hosting credentials missing, uploads disabled");
            Arc::new(DisabledMediaStore)
        }
    };

    let addr = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config, redis, media));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, closing connections...");
    close_pool(pool).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
