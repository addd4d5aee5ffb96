//! Configuration management system
//!
//! Provides centralized configuration management with support for:
//! - TOML configuration files (auto-created with defaults when missing)
//! - Environment variable overrides (prefixed with GVA_)
//! - Persisted mutations (API key, language) via temp-file + rename
//!
//! The configuration is an explicit object handed to whichever component
//! needs it; there is no process-wide mutable state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Scan execution configuration
    pub scan: ScanConfig,
    /// Report output configuration
    pub report: ReportConfig,
    /// LLM analysis configuration
    pub analysis: AnalysisConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Console message language (de, en, es)
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Target host or IP; empty means auto-detect the network peer
    pub target: String,
    /// Argument string handed to nmap, split with shell-word rules
    pub nmap_args: String,
    /// Explicit nmap binary path; overrides PATH lookup when set
    pub binary_path: Option<PathBuf>,
    /// Wall-clock limit per subprocess attempt in seconds
    pub timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            nmap_args: "-sS -T4 -v -sV".to_string(),
            binary_path: None,
            timeout_secs: 900,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Destination path for the text report, overwritten on each run
    pub output_path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("report.txt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// OpenAI API key; env vars OPENAI_API_KEY / GVA_OPENAI_KEY take priority
    pub api_key: String,
    /// Chat model used for the risk summary
    pub model: String,
    /// Directory for generated analysis files
    pub output_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            output_dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
    /// Log file path (None for console only)
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            report: ReportConfig::default(),
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig::default(),
            language: "de".to_string(),
        }
    }
}

/// Languages accepted by the message catalog
pub const VALID_LANGUAGES: [&str; 3] = ["de", "en", "es"];

impl AppConfig {
    /// Load configuration from file with environment variable overrides
    pub async fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        info!("Loading configuration from: {}", config_path.display());

        let mut settings = config::Config::builder();

        // Start with default configuration
        settings = settings.add_source(config::Config::try_from(&Self::default())?);

        // Load from config file if it exists
        if config_path.exists() {
            debug!("Found configuration file, loading settings");
            settings = settings.add_source(config::File::from(config_path));
        } else {
            info!("No configuration file found, using defaults");
            // Create default config file
            Self::default().save(config_path).await?;
        }

        // Override with environment variables (prefixed with GVA_)
        settings = settings.add_source(
            config::Environment::with_prefix("GVA")
                .separator("_")
                .try_parsing(true),
        );

        let config: AppConfig = settings
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Persist the configuration as TOML via temp-file + rename
    ///
    /// The rename keeps readers of the config path from ever observing a
    /// partially written file.
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let tmp_path = path.with_extension("toml.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .context("Failed to write configuration file")?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .context("Failed to replace configuration file")?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.scan.timeout_secs == 0 {
            return Err(anyhow::anyhow!("scan.timeout_secs must be greater than 0"));
        }

        // Validate logging level
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid logging level: {}",
                    self.logging.level
                ))
            }
        }

        // Validate logging format
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid logging format: {}",
                    self.logging.format
                ))
            }
        }

        // Validate language code
        if !VALID_LANGUAGES.contains(&self.language.to_lowercase().as_str()) {
            return Err(anyhow::anyhow!("Invalid language: {}", self.language));
        }

        debug!("Configuration validation passed");
        Ok(())
    }

    /// Set and persist the OpenAI API key
    pub async fn set_api_key<P: AsRef<Path>>(&mut self, key: &str, path: P) -> Result<()> {
        self.analysis.api_key = key.trim().to_string();
        self.save(path).await
    }

    /// Remove the persisted OpenAI API key
    pub async fn clear_api_key<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.analysis.api_key.clear();
        self.save(path).await
    }

    /// Set and persist the console language
    pub async fn set_language<P: AsRef<Path>>(&mut self, code: &str, path: P) -> Result<()> {
        let code = code.trim().to_lowercase();
        if !VALID_LANGUAGES.contains(&code.as_str()) {
            return Err(anyhow::anyhow!("Invalid language: {} (use de|en|es)", code));
        }
        self.language = code;
        self.save(path).await
    }

    /// Get the per-attempt scan timeout as Duration
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan.timeout_secs)
    }
}
