use anyhow::{Context, Result};
use fmswatch::config::{load_config, DEFAULT_CONFIG_PATH};
use fmswatch_notifier::PollingDriver;
use std::path::PathBuf;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fmswatch=info,fmswatch_notifier=info".into()),
        )
        .init();

    let config_path = std::env::var("FMSWATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from '{}'", config_path.display()))?;
    config.apply_env_overrides();
    config.validate().context("Invalid configuration")?;

    info!(
        config = %config_path.display(),
        snapshot = %config.snapshot.path.display(),
        backend = ?config.push.backend,
        email = config.email.enabled,
        "Configuration loaded"
    );

    let driver = PollingDriver::from_config(&config)?;
    let summary = driver.run_once().await?;

    info!(%summary, "fmswatch finished");
    Ok(())
}
