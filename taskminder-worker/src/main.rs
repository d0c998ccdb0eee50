//! # Taskminder Worker
//!
//! Sends task reminders. Runs the periodic sweep, executes notification jobs
//! queued by the API and, when a bot token is configured, the Telegram
//! chat-linking bot.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskminder-worker
//! ```

use std::sync::Arc;
use taskminder_shared::db::pool::{close_pool, create_pool};
use taskminder_worker::{
    channels::TelegramClient,
    config::WorkerConfig,
    dispatch::Dispatcher,
    orchestrator::{OrchestratorConfig, WorkerOrchestrator},
    telegram_link::TelegramLinker,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskminder_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Taskminder Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env()?;
    tracing::debug!(config = ?config, "Configuration loaded");

    let pool = create_pool(config.pool_config()).await?;
    tracing::info!("Database pool created");

    let dispatcher = Arc::new(Dispatcher::from_config(&config)?);
    let registered = dispatcher.registered();
    if registered.is_empty() {
        tracing::warn!("No notification channels configured; reminders will be skipped");
    } else {
        tracing::info!(channels = ?registered, "Notification channels ready");
    }

    let orchestrator = WorkerOrchestrator::new(
        pool.clone(),
        dispatcher,
        OrchestratorConfig::from(&config),
    );
    let shutdown = orchestrator.shutdown_token();

    let bot = config.telegram.as_ref().map(|telegram| {
        let linker = TelegramLinker::new(pool.clone(), TelegramClient::new(telegram));
        tokio::spawn(linker.run(shutdown.clone()))
    });

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
        }
        signal_token.cancel();
    });

    tracing::info!("Worker ready");
    orchestrator.run().await;

    if let Some(bot) = bot {
        if let Err(e) = bot.await {
            tracing::error!(error = %e, "Telegram bot task panicked");
        }
    }

    close_pool(pool).await;
    tracing::info!("Worker stopped");

    Ok(())
}
