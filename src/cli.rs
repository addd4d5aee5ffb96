//! Command-line interface definition
//!
//! Provides CLI argument parsing with support for:
//! - Target and scan argument overrides
//! - Report, timeout and language options
//! - Non-interactive maintenance verbs (API key, language)
//! - The plug-and-play autoscan entry point

use clap::Parser;
use std::path::PathBuf;

use crate::config::VALID_LANGUAGES;

#[derive(Parser, Debug)]
#[command(
    name = "ghostvenom",
    about = "Host-based security scanning helper",
    long_about = "Scans a target with nmap under privilege-aware fallback, parses the output \
conservatively, renders a text report and optionally forwards results to an LLM for a \
qualitative risk summary"
)]
pub struct Cli {
    /// Target host or IP; omitted means config value or auto-detected peer
    pub target: Option<String>,

    /// Argument string passed to nmap (shell-word rules apply)
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub scan_args: Option<String>,

    /// Report output path
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", default_value = "config.toml")]
    pub config_path: PathBuf,

    /// Per-attempt scan timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Console language (de, en, es)
    #[arg(short = 'l', long, value_name = "LANG")]
    pub language: Option<String>,

    /// Skip the LLM analysis step
    #[arg(long)]
    pub skip_analysis: bool,

    /// Increase verbosity level
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub validate_config: bool,

    // Maintenance verbs (non-interactive replacements for setup prompts)
    /// Store an OpenAI API key in the config file and exit
    #[arg(long, value_name = "KEY")]
    pub set_api_key: Option<String>,

    /// Remove the stored OpenAI API key and exit
    #[arg(long)]
    pub clear_api_key: bool,

    /// Store the console language in the config file and exit
    #[arg(long, value_name = "LANG")]
    pub set_language: Option<String>,

    // Plug-and-play autoscan
    /// Run the autoscan flow for a just-connected interface
    #[arg(long)]
    pub plug_and_play: bool,

    /// Interface name for the autoscan flow
    #[arg(short = 'i', long, value_name = "INTERFACE")]
    pub interface: Option<String>,

    /// Interface IPv4 address for the autoscan flow
    #[arg(long, value_name = "ADDR")]
    pub address: Option<String>,

    /// Interface netmask for the autoscan flow
    #[arg(long, value_name = "MASK")]
    pub netmask: Option<String>,
}

impl Cli {
    /// Validate CLI arguments and resolve conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.quiet && self.verbose > 0 {
            return Err("Cannot use both quiet and verbose modes".to_string());
        }

        for lang in [self.language.as_deref(), self.set_language.as_deref()]
            .into_iter()
            .flatten()
        {
            if !VALID_LANGUAGES.contains(&lang.to_lowercase().as_str()) {
                return Err(format!("Invalid language: {} (use de|en|es)", lang));
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be greater than 0".to_string());
            }
        }

        if self.plug_and_play
            && (self.interface.is_none() || self.address.is_none() || self.netmask.is_none())
        {
            return Err(
                "--plug-and-play requires --interface, --address and --netmask".to_string(),
            );
        }

        Ok(())
    }

    /// Check whether a maintenance verb was requested
    pub fn has_maintenance_command(&self) -> bool {
        self.set_api_key.is_some() || self.clear_api_key || self.set_language.is_some()
    }

    /// Effective log level honoring the verbosity flags
    pub fn effective_log_level(&self, configured: &str) -> String {
        if self.quiet {
            "warn".to_string()
        } else {
            match self.verbose {
                0 => configured.to_string(),
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation() {
        let cli = Cli::parse_from(["ghostvenom"]);
        assert!(cli.validate().is_ok());
        assert!(cli.target.is_none());
        assert_eq!(cli.config_path, PathBuf::from("config.toml"));
    }

    #[test]
    fn test_target_and_scan_args() {
        let cli = Cli::parse_from(["ghostvenom", "10.0.0.1", "--scan-args", "-sT -T4"]);
        assert!(cli.validate().is_ok());
        assert_eq!(cli.target.as_deref(), Some("10.0.0.1"));
        assert_eq!(cli.scan_args.as_deref(), Some("-sT -T4"));
    }

    #[test]
    fn test_conflicting_verbosity_flags() {
        let cli = Cli::parse_from(["ghostvenom", "-q", "-v"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_invalid_language_rejected() {
        let cli = Cli::parse_from(["ghostvenom", "--language", "fr"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let cli = Cli::parse_from(["ghostvenom", "--timeout", "0"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_plug_and_play_requires_interface_details() {
        let cli = Cli::parse_from(["ghostvenom", "--plug-and-play"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from([
            "ghostvenom",
            "--plug-and-play",
            "--interface",
            "eth1",
            "--address",
            "192.168.5.17",
            "--netmask",
            "255.255.255.0",
        ]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_maintenance_detection() {
        let cli = Cli::parse_from(["ghostvenom", "--set-api-key", "sk-test"]);
        assert!(cli.has_maintenance_command());

        let cli = Cli::parse_from(["ghostvenom", "--clear-api-key"]);
        assert!(cli.has_maintenance_command());

        let cli = Cli::parse_from(["ghostvenom"]);
        assert!(!cli.has_maintenance_command());
    }

    #[test]
    fn test_effective_log_level() {
        let quiet = Cli::parse_from(["ghostvenom", "-q"]);
        assert_eq!(quiet.effective_log_level("info"), "warn");

        let verbose = Cli::parse_from(["ghostvenom", "-v"]);
        assert_eq!(verbose.effective_log_level("info"), "debug");

        let plain = Cli::parse_from(["ghostvenom"]);
        assert_eq!(plain.effective_log_level("info"), "info");
    }
}
