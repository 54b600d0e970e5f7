//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Quire configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use crate::core::exporters::ExporterSet;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Output Directory: {}", config.export.output_dir.display());
        println!("  Workers: {}", config.export.max_workers);
        println!("  Queue Timeout: {}ms", config.export.queue_timeout_ms);
        println!("  Shutdown Timeout: {}s", config.export.shutdown_timeout_secs);
        println!("  Filename Prefix: {}", config.export.filename_prefix);
        println!("  Task Retention: {}s", config.export.task_retention_secs);
        println!("  Cleanup Age: {} day(s)", config.export.cleanup_max_age_days);
        println!(
            "  File Logging: {}",
            if config.logging.local_enabled {
                format!("{} ({})", config.logging.local_path, config.logging.local_rotation)
            } else {
                "disabled".to_string()
            }
        );
        println!(
            "  Formats: {}",
            ExporterSet::default()
                .supported_formats()
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!();
        Ok(EXIT_OK)
    }
}
