//! Cleanup command implementation
//!
//! Removes export files older than a cutoff from the output directory.

use crate::adapters::InMemoryReportProvider;
use crate::cli::{EXIT_FATAL, EXIT_OK, EXIT_SUBMISSION};
use crate::config::QuireConfig;
use crate::core::export::ExportManager;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the cleanup command
#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Delete files older than this many days (default from configuration)
    #[arg(long)]
    pub max_age_days: Option<u64>,

    /// Override the configured output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

impl CleanupArgs {
    /// Execute the cleanup command
    pub async fn execute(&self, mut config: QuireConfig) -> anyhow::Result<i32> {
        if let Some(output_dir) = &self.output_dir {
            config.export.output_dir = output_dir.clone();
        }
        let max_age_days = self
            .max_age_days
            .unwrap_or(config.export.cleanup_max_age_days);

        tracing::info!(
            output_dir = %config.export.output_dir.display(),
            max_age_days,
            "Starting cleanup command"
        );

        let manager = match ExportManager::builder(
            config.export,
            Arc::new(InMemoryReportProvider::new()),
        )
        .workers(1)
        .build()
        .await
        {
            Ok(manager) => manager,
            Err(e) => {
                eprintln!("Failed to open output directory: {e}");
                return Ok(EXIT_SUBMISSION);
            }
        };

        let outcome = manager.cleanup_old_files(max_age_days).await;
        manager.shutdown().await;

        match outcome {
            Ok(removed) => {
                println!(
                    "🧹 Removed {removed} file(s) older than {max_age_days} day(s) from {}",
                    manager.output_dir().display()
                );
                Ok(EXIT_OK)
            }
            Err(e) => {
                eprintln!("Cleanup failed: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }
}
