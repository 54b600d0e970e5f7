//! Export manager
//!
//! The caller-facing entry point. It resolves reports through a
//! [`ReportProvider`], renders markup content, picks a unique output file and
//! hands the task to the [`TaskQueue`].

use super::render::{BuiltinRenderer, ContentRenderer};
use crate::adapters::ReportProvider;
use crate::config::schema::is_valid_prefix;
use crate::config::ExportConfig;
use crate::core::exporters::{Capabilities, ExporterSet};
use crate::core::queue::{QueueSettings, QueueStats, TaskQueue};
use crate::domain::{
    ExportFormat, ExportOptions, ExportPayload, ExportTask, QuireError, ReportId, ReportRecord,
    Result, TaskId, TaskStatusView,
};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;

/// Timestamp embedded in output filenames (UTC)
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Builder for [`ExportManager`]
pub struct ExportManagerBuilder {
    config: ExportConfig,
    provider: Arc<dyn ReportProvider>,
    renderer: Arc<dyn ContentRenderer>,
    capabilities: Capabilities,
    workers: Option<usize>,
}

impl ExportManagerBuilder {
    /// Use a custom content renderer for markup formats
    pub fn renderer(mut self, renderer: Arc<dyn ContentRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Restrict the optional exporters
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Override the configured worker count
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Create the output directory, probe exporters and start the workers
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::OutputDirectory`] if the output directory
    /// cannot be created, or the error from [`TaskQueue::start`].
    pub async fn build(self) -> Result<ExportManager> {
        let output_dir = self.config.output_dir.clone();
        tokio::fs::create_dir_all(&output_dir).await.map_err(|e| {
            QuireError::OutputDirectory(format!(
                "Failed to create {}: {e}",
                output_dir.display()
            ))
        })?;

        let exporters = Arc::new(ExporterSet::new(self.capabilities));
        let mut settings = QueueSettings::from_config(&self.config);
        if let Some(workers) = self.workers {
            settings = settings.with_workers(workers);
        }

        let queue = TaskQueue::new(settings, Arc::clone(&exporters));
        queue.start().await?;

        tracing::info!(
            output_dir = %output_dir.display(),
            workers = settings.workers,
            formats = ?exporters.supported_formats(),
            "Export manager ready"
        );

        Ok(ExportManager {
            config: self.config,
            output_dir,
            provider: self.provider,
            renderer: self.renderer,
            exporters,
            queue,
            submit_lock: Mutex::new(()),
        })
    }
}

/// Asynchronous report export service
///
/// # Example
///
/// ```rust,no_run
/// use quire::adapters::InMemoryReportProvider;
/// use quire::config::ExportConfig;
/// use quire::core::export::ExportManager;
/// use quire::domain::{ExportFormat, ExportOptions, ReportId, ReportRecord};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> quire::domain::Result<()> {
/// let provider = Arc::new(InMemoryReportProvider::with_reports([
///     ReportRecord::new(ReportId::new(7), "Nightly"),
/// ]));
/// let manager = ExportManager::builder(ExportConfig::default(), provider)
///     .build()
///     .await?;
///
/// let task_id = manager
///     .export_report(ReportId::new(7), ExportFormat::Html, ExportOptions::new())
///     .await?;
/// let task = manager.wait_for_export(task_id, Duration::from_secs(10)).await;
/// println!("{:?}", task.map(|t| t.status));
///
/// manager.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct ExportManager {
    config: ExportConfig,
    output_dir: PathBuf,
    provider: Arc<dyn ReportProvider>,
    renderer: Arc<dyn ContentRenderer>,
    exporters: Arc<ExporterSet>,
    queue: TaskQueue,
    submit_lock: Mutex<()>,
}

impl ExportManager {
    /// Start building a manager
    pub fn builder(config: ExportConfig, provider: Arc<dyn ReportProvider>) -> ExportManagerBuilder {
        ExportManagerBuilder {
            config,
            provider,
            renderer: Arc::new(BuiltinRenderer::new()),
            capabilities: Capabilities::detect(),
            workers: None,
        }
    }

    /// Build a manager with the built-in renderer and detected capabilities
    ///
    /// # Errors
    ///
    /// See [`ExportManagerBuilder::build`].
    pub async fn new(config: ExportConfig, provider: Arc<dyn ReportProvider>) -> Result<Self> {
        Self::builder(config, provider).build().await
    }

    /// Directory export files are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Submit an export and return its task id immediately
    ///
    /// Formats whose exporter is unavailable are still accepted; the task
    /// fails once a worker picks it up. Check [`Self::get_supported_formats`]
    /// beforehand to avoid that.
    ///
    /// # Errors
    ///
    /// - [`QuireError::QueueStopped`] after [`Self::shutdown`]
    /// - [`QuireError::ReportNotFound`] if the provider does not know the report
    /// - [`QuireError::Provider`] if the provider lookup fails
    /// - [`QuireError::Render`] if markup content cannot be rendered
    /// - [`QuireError::OutputDirectory`] if the output directory cannot be
    ///   inspected
    pub async fn export_report(
        &self,
        report_id: ReportId,
        format: ExportFormat,
        options: ExportOptions,
    ) -> Result<TaskId> {
        if !self.queue.is_running() {
            return Err(QuireError::QueueStopped);
        }

        let report = self
            .provider
            .fetch_report(report_id)
            .await?
            .ok_or(QuireError::ReportNotFound(report_id))?;

        let payload = self.prepare_payload(&report, format, &options)?;

        let _guard = self.submit_lock.lock().await;
        let destination = self
            .resolve_destination(report_id, format, &options, Utc::now())
            .await?;
        let task = ExportTask::new(report_id, format, options, destination, payload);
        let task_id = self.queue.add_task(task)?;

        tracing::info!(
            task_id = %task_id,
            report_id = %report_id,
            format = %format,
            "Export submitted"
        );
        Ok(task_id)
    }

    /// Full snapshot of a task, `None` if unknown or evicted
    pub fn get_export_status(&self, task_id: TaskId) -> Option<ExportTask> {
        self.queue.get_task_status(task_id)
    }

    /// Status projection for polling callers
    pub fn status(&self, task_id: TaskId) -> Option<TaskStatusView> {
        self.get_export_status(task_id)
            .map(|task| task.status_view())
    }

    /// Wait until the task is terminal or `timeout` elapses
    ///
    /// Returns the latest snapshot, which is still non-terminal on timeout.
    pub async fn wait_for_export(&self, task_id: TaskId, timeout: Duration) -> Option<ExportTask> {
        self.queue.wait_for_completion(task_id, timeout).await
    }

    /// Formats whose exporter initialized successfully
    pub fn get_supported_formats(&self) -> Vec<ExportFormat> {
        self.exporters.supported_formats()
    }

    /// Delete regular files in the output directory older than `max_age_days`
    ///
    /// Files that cannot be inspected or removed are logged and skipped.
    /// Returns the number of files deleted.
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::OutputDirectory`] if the directory cannot be
    /// listed.
    pub async fn cleanup_old_files(&self, max_age_days: u64) -> Result<usize> {
        remove_files_older_than(
            &self.output_dir,
            Duration::from_secs(max_age_days.saturating_mul(SECONDS_PER_DAY)),
        )
        .await
    }

    /// [`Self::cleanup_old_files`] with the configured age
    ///
    /// # Errors
    ///
    /// See [`Self::cleanup_old_files`].
    pub async fn cleanup_with_configured_age(&self) -> Result<usize> {
        self.cleanup_old_files(self.config.cleanup_max_age_days)
            .await
    }

    /// Queue activity counters
    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Evict terminal tasks older than the retention window
    pub fn purge_expired_tasks(&self) -> usize {
        self.queue.purge_expired_tasks()
    }

    /// Stop the workers and reject further submissions
    ///
    /// Exports already running finish within the configured shutdown
    /// timeout. Tasks that never reached a worker are marked failed. Safe to
    /// call more than once.
    pub async fn shutdown(&self) {
        let _guard = self.submit_lock.lock().await;
        self.queue.stop().await;
        self.queue
            .fail_queued("Export manager shut down before the task started")
            .await;
    }

    fn prepare_payload(
        &self,
        report: &ReportRecord,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<ExportPayload> {
        if format.uses_rendered_content() {
            Ok(ExportPayload::Content(self.renderer.render(report, options)?))
        } else {
            Ok(ExportPayload::Data(report.export_data()))
        }
    }

    // Caller must hold the submit lock so concurrent submissions cannot pick
    // the same name.
    async fn resolve_destination(
        &self,
        report_id: ReportId,
        format: ExportFormat,
        options: &ExportOptions,
        now: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let prefix = options
            .filename_prefix
            .as_deref()
            .and_then(sanitize_prefix)
            .unwrap_or_else(|| self.config.filename_prefix.clone());
        let stem = format!(
            "{prefix}_{report_id}_{}",
            now.format(FILENAME_TIMESTAMP_FORMAT)
        );

        let mut candidate = self
            .output_dir
            .join(format!("{stem}.{}", format.extension()));
        let mut suffix = 1;
        while self.is_taken(&candidate).await? {
            candidate = self
                .output_dir
                .join(format!("{stem}-{suffix}.{}", format.extension()));
            suffix += 1;
        }
        Ok(candidate)
    }

    async fn is_taken(&self, path: &Path) -> Result<bool> {
        if self.queue.registry().is_destination_claimed(path) {
            return Ok(true);
        }
        tokio::fs::try_exists(path).await.map_err(|e| {
            QuireError::OutputDirectory(format!("Failed to inspect {}: {e}", path.display()))
        })
    }
}

/// Reduce a caller-supplied prefix to filename-safe characters
///
/// Returns `None` when nothing usable remains.
pub fn sanitize_prefix(prefix: &str) -> Option<String> {
    let cleaned: String = prefix
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('_').to_string();
    is_valid_prefix(&cleaned).then_some(cleaned)
}

async fn remove_files_older_than(dir: &Path, max_age: Duration) -> Result<usize> {
    let cutoff = SystemTime::now()
        .checked_sub(max_age)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        QuireError::OutputDirectory(format!("Failed to list {}: {e}", dir.display()))
    })?;

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Failed to read directory entry");
                break;
            }
        };

        let path = entry.path();
        let modified = match entry.metadata().await {
            Ok(metadata) if metadata.is_file() => metadata.modified(),
            Ok(_) => continue,
            Err(e) => Err(e),
        };

        match modified {
            Ok(modified) if modified < cutoff => match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Removed old export file");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove export file");
                }
            },
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to inspect export file");
            }
        }
    }

    tracing::info!(dir = %dir.display(), removed, "Export cleanup finished");
    Ok(removed)
}
