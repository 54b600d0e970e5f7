//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{DEFAULT_CONFIG_PATH, EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub output: String,

    /// Include comments explaining every option
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match tokio::fs::write(&self.output, config_content).await {
            Ok(()) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Validate configuration: quire validate-config");
                println!("  3. Run export: quire export --reports reports.json");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Quire Configuration File

[application]
log_level = "info"

[export]
output_dir = "exports"
max_workers = 3
queue_timeout_ms = 1000
shutdown_timeout_secs = 5
filename_prefix = "report"
task_retention_secs = 3600
cleanup_max_age_days = 7

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with comments
    fn generate_config_with_examples() -> String {
        r#"# Quire Configuration File
#
# Every option has a default; remove anything you do not need to change.
# Values may reference environment variables as ${VAR_NAME}, and any option
# can be overridden with QUIRE_<SECTION>_<OPTION> (e.g. QUIRE_EXPORT_MAX_WORKERS).

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
log_level = "info"

# ============================================================================
# Export Engine
# ============================================================================
[export]
# Directory export files are written to (created on startup)
output_dir = "exports"

# Number of concurrent export workers (1-64)
max_workers = 3

# How long an idle worker waits for work before housekeeping, in milliseconds
queue_timeout_ms = 1000

# Upper bound on waiting for workers during shutdown, in seconds
shutdown_timeout_secs = 5

# Default filename prefix: {prefix}_{report_id}_{YYYYMMDD_HHMMSS}.{ext}
filename_prefix = "report"

# How long finished tasks stay queryable, in seconds
task_retention_secs = 3600

# Age in days after which `quire cleanup` deletes export files
cleanup_max_age_days = 7

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Write JSON logs to a rotating file in addition to the console
local_enabled = false

# Log directory
local_path = "logs"

# Log rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}
