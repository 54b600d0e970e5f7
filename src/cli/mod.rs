//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Quire using clap.

pub mod commands;

use crate::config::{load_config, load_config_str, QuireConfig};
use crate::domain::Result;
use clap::{Parser, Subcommand};
use std::path::Path;

/// Configuration file used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "quire.toml";

/// Exit code for a successful run
pub const EXIT_OK: i32 = 0;
/// Exit code for configuration problems
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for rejected submissions
pub const EXIT_SUBMISSION: i32 = 3;
/// Exit code when an export task failed
pub const EXIT_EXPORT_FAILED: i32 = 4;
/// Exit code for unexpected errors
pub const EXIT_FATAL: i32 = 5;

/// Quire - asynchronous report export engine
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(version, about, long_about = None)]
#[command(author = "Quire Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "QUIRE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "QUIRE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export reports and wait for the files
    Export(commands::export::ExportArgs),

    /// List the output formats this build can produce
    Formats(commands::formats::FormatsArgs),

    /// Delete old files from the output directory
    Cleanup(commands::cleanup::CleanupArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

/// Load the configuration for a command
///
/// A missing file is only tolerated for the default path, in which case the
/// built-in defaults (plus `QUIRE_*` overrides) are used.
///
/// # Errors
///
/// Returns a configuration error if the file cannot be loaded or is invalid.
pub fn load_settings(path: &str) -> Result<QuireConfig> {
    if path == DEFAULT_CONFIG_PATH && !Path::new(path).exists() {
        tracing::debug!("No configuration file found, using defaults");
        return load_config_str("");
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from([
            "quire",
            "export",
            "--reports",
            "reports.json",
            "--report-id",
            "7",
        ]);
        assert_eq!(cli.config, "quire.toml");
        assert!(matches!(cli.command, Commands::Export(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["quire", "--config", "custom.toml", "formats"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["quire", "--log-level", "debug", "formats"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["quire", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_cleanup() {
        let cli = Cli::parse_from(["quire", "cleanup", "--max-age-days", "3"]);
        match cli.command {
            Commands::Cleanup(args) => assert_eq!(args.max_age_days, Some(3)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["quire", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        assert!(load_settings("/nonexistent/quire.toml").is_err());
    }
}
