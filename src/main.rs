//! GhostVenom - Host-Based Security Scanning Helper
//!
//! Main entry point. Parses CLI arguments, loads configuration,
//! initializes logging and runs the scan pipeline.

use anyhow::Result;
use clap::Parser;
use ghostvenom::{
    cli::Cli,
    config::AppConfig,
    core::Application,
    logging,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    cli.validate().map_err(|e| anyhow::anyhow!(e))?;

    // Load configuration and apply CLI overrides
    let mut config = AppConfig::load(&cli.config_path).await?;
    if let Some(timeout) = cli.timeout {
        config.scan.timeout_secs = timeout;
    }
    if let Some(language) = &cli.language {
        config.language = language.to_lowercase();
    }

    // Initialize logging with the effective level
    let mut logging_config = config.logging.clone();
    logging_config.level = cli.effective_log_level(&config.logging.level);
    logging::init_logging_with_config(&logging_config)?;

    info!("Starting ghostvenom application");

    // Create and run application
    let config_path = cli.config_path.clone();
    let mut app = Application::new(config, config_path);
    app.run(cli).await?;

    info!("Application completed successfully");
    Ok(())
}
