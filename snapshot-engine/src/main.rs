// Snapshot engine daemon
// Loads configuration, starts the daily auto-snapshot scheduler and waits for Ctrl-C

use anyhow::Context;
use snapshot_engine::app::AppState;
use snapshot_engine::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapshot_engine=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting snapshot engine v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let state = AppState::initialize(config)
        .await
        .context("Failed to initialize application")?;

    let settings = state.settings.get_settings().await?;
    tracing::info!(
        "Auto snapshots {} at {} ({})",
        if settings.enabled { "enabled" } else { "disabled" },
        settings.time,
        settings.timezone
    );

    state.scheduler.start().await?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutdown requested");
    state.scheduler.shutdown().await?;

    Ok(())
}
