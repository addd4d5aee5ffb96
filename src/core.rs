//! Application orchestration
//!
//! Owns the configuration, message catalog, scan executor and analyzer,
//! and runs the sequential pipeline: resolve target, scan, analysis
//! (best-effort), report (best-effort), system metadata, connectivity
//! demo. Single-threaded flow with one live subprocess at a time.

use std::path::PathBuf;
use tracing::{info, warn};

use crate::{
    analysis::{self, GptAnalyzer},
    autoscan,
    cli::Cli,
    config::AppConfig,
    connectivity,
    error::Result,
    i18n::{Catalog, Language},
    network, report,
    scanner::{self, NmapExecutor},
    system_info,
};

/// Main application orchestrator
pub struct Application {
    config: AppConfig,
    config_path: PathBuf,
    catalog: Catalog,
    executor: NmapExecutor,
    analyzer: GptAnalyzer,
}

impl Application {
    /// Create a new application instance from loaded configuration
    pub fn new(config: AppConfig, config_path: PathBuf) -> Self {
        let language = Language::parse(&config.language).unwrap_or(Language::De);
        let catalog = Catalog::new(language);
        let executor = scanner::create_executor(&config);
        let analyzer = analysis::create_analyzer(&config);

        Self {
            config,
            config_path,
            catalog,
            executor,
            analyzer,
        }
    }

    /// Run the application with CLI arguments
    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        if cli.has_maintenance_command() {
            return self.run_maintenance(&cli).await;
        }

        if cli.validate_config {
            self.config.validate()?;
            println!("Configuration OK: {}", self.config_path.display());
            return Ok(());
        }

        if cli.plug_and_play {
            // Validated by the CLI layer; all three are present here
            let (Some(interface), Some(address), Some(netmask)) =
                (&cli.interface, &cli.address, &cli.netmask)
            else {
                return Err(crate::error::GhostVenomError::validation(
                    "plug_and_play",
                    "interface, address and netmask are required",
                ));
            };
            return autoscan::run_plug_and_play(
                &self.executor,
                &self.analyzer,
                self.effective_scan_args(&cli),
                &self.effective_report_path(&cli),
                interface,
                address,
                netmask,
            )
            .await;
        }

        self.run_scan_pipeline(&cli).await
    }

    /// The sequential scan pipeline
    async fn run_scan_pipeline(&self, cli: &Cli) -> Result<()> {
        println!("\n{}\n", self.catalog.app_start());

        // Resolve target: CLI, then config, then network probing
        let target = match cli.target.as_deref() {
            Some(target) => target.to_string(),
            None if !self.config.scan.target.is_empty() => self.config.scan.target.clone(),
            None => network::detect_peer().await,
        };
        let args_raw = self.effective_scan_args(cli);

        println!("{}: {}", self.catalog.label_target(), target);
        println!("{}: {}", self.catalog.label_scan_args(), args_raw);
        println!("{}\n", self.catalog.scan_start());

        // The executor always returns text, never an error
        let scan_text = self.executor.execute_text(&target, args_raw).await;

        if scan_text.trim().is_empty() {
            println!("{}", self.catalog.scan_no_result());
        } else {
            let preview: Vec<&str> = scan_text.lines().take(10).collect();
            println!("{}\n{}", self.catalog.scan_preview(), preview.join("\n"));
        }

        // LLM analysis is best-effort and never blocks the pipeline
        if !cli.skip_analysis {
            self.run_analysis(&scan_text).await;
        }

        // Report write failure is a non-fatal notice
        println!("\n{}", self.catalog.report_create());
        let report_path = self.effective_report_path(cli);
        match report::create_report(&scan_text, &report_path).await {
            Ok(ports) => {
                info!(ports = ports.len(), "Report generated");
                println!(
                    "{}",
                    self.catalog.report_saved(&report_path.display().to_string())
                );
            }
            Err(e) => {
                warn!("Report generation failed: {}", e);
                println!("{}", self.catalog.report_error(&e.to_string()));
            }
        }

        // System metadata
        println!("\n{}", self.catalog.sysinfo_collect());
        println!("{}", system_info::collect_system_info());

        // Opt-in connectivity demo
        println!("\n{}", self.catalog.demo_try());
        if connectivity::demo_target_from_env().is_none() {
            println!("{}", self.catalog.demo_skipped());
        } else {
            let connected = connectivity::attempt_connectivity_demo().await;
            info!(connected = connected, "Connectivity demo finished");
        }

        println!("\n{}", self.catalog.app_done());
        Ok(())
    }

    /// Scan argument string with command-line override applied
    fn effective_scan_args<'a>(&'a self, cli: &'a Cli) -> &'a str {
        cli.scan_args
            .as_deref()
            .unwrap_or(&self.config.scan.nmap_args)
    }

    /// Report path with command-line override applied
    fn effective_report_path(&self, cli: &Cli) -> PathBuf {
        cli.output
            .clone()
            .unwrap_or_else(|| self.config.report.output_path.clone())
    }

    async fn run_analysis(&self, scan_text: &str) {
        if !self.analyzer.has_api_key() {
            println!("{}", self.catalog.analysis_no_key());
            return;
        }
        if scan_text.trim().is_empty() {
            println!("{}", self.catalog.analysis_skipped());
            return;
        }

        println!("\n{}", self.catalog.analysis_start());
        match self.analyzer.analyze(scan_text).await {
            Ok(path) => println!(
                "{}",
                self.catalog.analysis_saved(&path.display().to_string())
            ),
            Err(e) => println!("{}", self.catalog.analysis_failed(&e.to_string())),
        }
    }

    async fn run_maintenance(&mut self, cli: &Cli) -> Result<()> {
        if let Some(key) = &cli.set_api_key {
            self.config.set_api_key(key, &self.config_path).await?;
            println!("API key saved to {}", self.config_path.display());
            return Ok(());
        }

        if cli.clear_api_key {
            self.config.clear_api_key(&self.config_path).await?;
            println!("API key removed from {}", self.config_path.display());
            return Ok(());
        }

        if let Some(code) = &cli.set_language {
            self.config.set_language(code, &self.config_path).await?;
            let language = Language::parse(code).unwrap_or(Language::De);
            self.catalog = Catalog::new(language);
            println!("{}", self.catalog.language_set(language));
            return Ok(());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> (AppConfig, PathBuf) {
        let mut config = AppConfig::default();
        config.report.output_path = dir.path().join("report.txt");
        (config, dir.path().join("config.toml"))
    }

    #[tokio::test]
    async fn test_maintenance_set_language_persists() {
        let dir = TempDir::new().unwrap();
        let (config, path) = test_config(&dir);
        let mut app = Application::new(config, path.clone());

        let cli = Cli::parse_from(["ghostvenom", "--set-language", "en"]);
        app.run(cli).await.unwrap();

        let reloaded = AppConfig::load(&path).await.unwrap();
        assert_eq!(reloaded.language, "en");
    }

    #[tokio::test]
    async fn test_maintenance_api_key_cycle() {
        let dir = TempDir::new().unwrap();
        let (config, path) = test_config(&dir);
        let mut app = Application::new(config, path.clone());

        let cli = Cli::parse_from(["ghostvenom", "--set-api-key", "sk-abc"]);
        app.run(cli).await.unwrap();
        assert_eq!(
            AppConfig::load(&path).await.unwrap().analysis.api_key,
            "sk-abc"
        );

        let cli = Cli::parse_from(["ghostvenom", "--clear-api-key"]);
        app.run(cli).await.unwrap();
        assert!(AppConfig::load(&path)
            .await
            .unwrap()
            .analysis
            .api_key
            .is_empty());
    }

    #[tokio::test]
    async fn test_cli_overrides_reach_every_flow() {
        let dir = TempDir::new().unwrap();
        let (config, path) = test_config(&dir);
        let config_report_path = config.report.output_path.clone();
        let app = Application::new(config, path);

        // Plug-and-play invocation with explicit scan-args and output
        let cli = Cli::parse_from([
            "ghostvenom",
            "--plug-and-play",
            "--interface",
            "eth1",
            "--address",
            "192.168.5.17",
            "--netmask",
            "255.255.255.0",
            "--scan-args",
            "-sT -F",
            "-o",
            "custom_report.txt",
        ]);
        assert_eq!(app.effective_scan_args(&cli), "-sT -F");
        assert_eq!(
            app.effective_report_path(&cli),
            PathBuf::from("custom_report.txt")
        );

        // Without overrides the configured values win
        let cli = Cli::parse_from(["ghostvenom"]);
        assert_eq!(app.effective_scan_args(&cli), app.config.scan.nmap_args);
        assert_eq!(app.effective_report_path(&cli), config_report_path);
    }

    #[tokio::test]
    async fn test_validate_config_flag() {
        let dir = TempDir::new().unwrap();
        let (config, path) = test_config(&dir);
        let mut app = Application::new(config, path);

        let cli = Cli::parse_from(["ghostvenom", "--validate-config"]);
        assert!(app.run(cli).await.is_ok());
    }
}
