//! Export command implementation
//!
//! This module implements the `export` command: it loads report records from
//! a JSON file, submits one export per report and format, and waits for the
//! files to be written.

use crate::adapters::JsonFileReportProvider;
use crate::cli::{EXIT_CONFIG, EXIT_EXPORT_FAILED, EXIT_FATAL, EXIT_OK, EXIT_SUBMISSION};
use crate::config::QuireConfig;
use crate::core::export::ExportManager;
use crate::domain::{
    ExportFormat, ExportOptions, ExportTask, QuireError, ReportId, TaskId, TaskStatus,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// JSON file holding one report record or an array of them
    #[arg(long, env = "QUIRE_REPORTS")]
    pub reports: PathBuf,

    /// Report to export (repeatable; defaults to every report in the file)
    #[arg(short, long = "report-id")]
    pub report_ids: Vec<ReportId>,

    /// Output format (repeatable)
    #[arg(short, long = "format", default_value = "html")]
    pub formats: Vec<ExportFormat>,

    /// Document title overriding the report title
    #[arg(long)]
    pub title: Option<String>,

    /// File with extra style rules for markup output
    #[arg(long)]
    pub css: Option<PathBuf>,

    /// Filename prefix for the output files
    #[arg(long)]
    pub prefix: Option<String>,

    /// Override the configured output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Override the configured worker count
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Seconds to wait for each export
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Print task status as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, mut config: QuireConfig) -> anyhow::Result<i32> {
        tracing::info!(reports = %self.reports.display(), "Starting export command");

        if let Some(output_dir) = &self.output_dir {
            tracing::info!(output_dir = %output_dir.display(), "Overriding output directory from CLI");
            config.export.output_dir = output_dir.clone();
        }

        let options = match self.build_options().await {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Invalid export options: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let provider = match JsonFileReportProvider::load(&self.reports).await {
            Ok(provider) => provider,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load reports");
                eprintln!("Failed to load reports: {e}");
                return Ok(EXIT_SUBMISSION);
            }
        };

        let report_ids = if self.report_ids.is_empty() {
            provider.report_ids()
        } else {
            self.report_ids.clone()
        };
        if report_ids.is_empty() {
            eprintln!("No reports to export in {}", self.reports.display());
            return Ok(EXIT_SUBMISSION);
        }

        let mut builder = ExportManager::builder(config.export, Arc::new(provider));
        if let Some(workers) = self.workers {
            builder = builder.workers(workers);
        }
        let manager = match builder.build().await {
            Ok(manager) => manager,
            Err(e @ QuireError::OutputDirectory(_)) => {
                eprintln!("{e}");
                return Ok(EXIT_SUBMISSION);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start export manager");
                eprintln!("Failed to start export manager: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let supported = manager.get_supported_formats();
        let mut rejected = 0usize;
        let mut submitted: Vec<TaskId> = Vec::new();

        for report_id in &report_ids {
            for format in &self.formats {
                if !supported.contains(format) {
                    let error = QuireError::UnsupportedFormat(*format);
                    eprintln!("Report {report_id}: {error}");
                    rejected += 1;
                    continue;
                }

                match manager
                    .export_report(*report_id, *format, options.clone())
                    .await
                {
                    Ok(task_id) => submitted.push(task_id),
                    Err(e) => {
                        crate::log_error_with_context!(e, "Export submission rejected");
                        eprintln!("Report {report_id} ({format}): {e}");
                        rejected += 1;
                    }
                }
            }
        }

        let timeout = Duration::from_secs(self.timeout_secs);
        let mut failed = 0usize;
        let mut interrupted = false;

        for task_id in submitted {
            let waited = tokio::select! {
                task = manager.wait_for_export(task_id, timeout) => task,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT (Ctrl+C), stopping export");
                    interrupted = true;
                    None
                }
            };
            if interrupted {
                break;
            }

            match waited {
                Some(task) => {
                    if task.status != TaskStatus::Completed {
                        failed += 1;
                    }
                    self.print_task(&task)?;
                }
                None => {
                    eprintln!("Task {task_id} is no longer tracked");
                    failed += 1;
                }
            }
        }

        manager.shutdown().await;

        let exit_code = if interrupted {
            130
        } else if rejected > 0 {
            EXIT_SUBMISSION
        } else if failed > 0 {
            EXIT_EXPORT_FAILED
        } else {
            EXIT_OK
        };

        tracing::info!(rejected, failed, exit_code, "Export command finished");
        Ok(exit_code)
    }

    async fn build_options(&self) -> anyhow::Result<ExportOptions> {
        let mut options = ExportOptions::new();
        if let Some(title) = &self.title {
            options = options.with_title(title.clone());
        }
        if let Some(prefix) = &self.prefix {
            options = options.with_filename_prefix(prefix.clone());
        }
        if let Some(css) = &self.css {
            let rules = tokio::fs::read_to_string(css).await.map_err(|e| {
                anyhow::anyhow!("Failed to read style file {}: {e}", css.display())
            })?;
            options = options.with_css(rules);
        }
        Ok(options)
    }

    fn print_task(&self, task: &ExportTask) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(&task.status_view())?);
            return Ok(());
        }

        match task.status {
            TaskStatus::Completed => println!(
                "✅ Report {} ({}): {}",
                task.report_id,
                task.format,
                task.file_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            ),
            TaskStatus::Failed => println!(
                "❌ Report {} ({}): {}",
                task.report_id,
                task.format,
                task.error_message.as_deref().unwrap_or("Export failed")
            ),
            status => println!(
                "⏳ Report {} ({}): still {} after {}s",
                task.report_id, task.format, status, self.timeout_secs
            ),
        }
        Ok(())
    }
}
