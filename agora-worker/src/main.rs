//! # Agora Worker
//!
//! Delivers queued notification emails from `email_outbox` through the mail
//! API. Without `MAIL_API_KEY` emails are logged and marked sent.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p agora-worker
//! ```

use agora_shared::db::migrations::get_migration_status;
use agora_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use agora_shared::integrations::mail::{EmailTransport, HttpMailer, LogTransport};
use agora_worker::config::WorkerConfig;
use agora_worker::dispatcher::{Dispatcher, DispatcherConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora_worker=debug,agora_shared=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Agora Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::load()?;

    let pool = create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::from_url(&config.database.url)
    })
    .await?;

    // The API owns migrations
    let status = get_migration_status(&pool).await?;
    if !status.is_up_to_date {
        tracing::warn!(?status, "Database schema is behind; start the API to migrate");
    }

    let transport: Arc<dyn EmailTransport> = match config.mailer() {
        Some(mailer) => Arc::new(HttpMailer::new(mailer)?),
        None => {
            tracing::warn!("MAIL_API_KEY not set, emails will only be logged");
            Arc::new(LogTransport)
        }
    };

    let dispatcher = Dispatcher::new(
        pool.clone(),
        transport,
        DispatcherConfig {
            poll_interval_secs: config.poll_interval_secs,
            batch_size: config.batch_size,
            claim_lease_secs: config.claim_lease_secs,
        },
    );

    let shutdown = dispatcher.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received, finishing current batch...");
        shutdown.cancel();
    });

    dispatcher.run().await?;

    close_pool(pool).await;
    Ok(())
}
