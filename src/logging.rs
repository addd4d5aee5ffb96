//! Logging and observability framework
//!
//! Provides structured logging with:
//! - Multiple output formats (JSON, pretty)
//! - Optional log file output via a non-blocking appender
//! - RUST_LOG-style directive overrides
//! - Noisy dependency crates clamped to info/warn

use anyhow::{Context, Result};
use std::{io, path::Path, sync::OnceLock};
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::{config::LoggingConfig, error::GhostVenomError};

// Keeps the non-blocking file writer alive for the process lifetime
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging with specific configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = create_env_filter(&config.level)?;

    let file_layer = match &config.file_path {
        Some(path) => Some(create_file_layer(path)?),
        None => None,
    };

    let registry = Registry::default().with(env_filter).with(file_layer);

    match config.format.as_str() {
        "json" => {
            let console_layer = fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_target(true);

            registry.with(console_layer).init();
        }
        _ => {
            let console_layer = fmt::layer()
                .pretty()
                .with_writer(io::stderr)
                .with_target(false);

            registry.with(console_layer).init();
        }
    }

    info!("Logging system initialized with level: {}", config.level);
    Ok(())
}

/// Create environment filter from log level string
fn create_env_filter(level: &str) -> Result<EnvFilter> {
    let base_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            return Err(GhostVenomError::config(format!("Invalid log level: {}", level)).into())
        }
    };

    // Create filter with module-specific levels
    let filter = EnvFilter::builder()
        .with_default_directive(base_level.into())
        .from_env()
        .context("Failed to create environment filter")?
        // Clamp chatty dependency crates
        .add_directive("hyper=info".parse()?)
        .add_directive("reqwest=info".parse()?)
        .add_directive("rustls=warn".parse()?);

    Ok(filter)
}

/// Create a non-blocking file layer writing to the given path
fn create_file_layer<S>(path: &Path) -> Result<Box<dyn tracing_subscriber::Layer<S> + Send + Sync>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync + 'static,
{
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir).context("Failed to create log directory")?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", path.display()))?;

    let appender = tracing_appender::rolling::never(
        dir.unwrap_or_else(|| Path::new(".")),
        file_name,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    Ok(Box::new(layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_creation() {
        let filter = create_env_filter("info");
        assert!(filter.is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let filter = create_env_filter("invalid");
        assert!(filter.is_err());
    }

    #[test]
    fn test_file_layer_creates_parent_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("scan.log");

        let layer = create_file_layer::<Registry>(&path);
        assert!(layer.is_ok());
        assert!(path.parent().unwrap().exists());
    }
}
