//! Export task and result model
//!
//! An [`ExportTask`] is created in the `Pending` state at submission and then
//! moves through `InProgress` to exactly one terminal state. The transition
//! methods enforce the state machine and the field invariants:
//!
//! - `file_path` is set if and only if the task is `Completed`
//! - `error_message` is set if and only if the task is `Failed`
//! - `progress` is `1.0` if and only if the task is `Completed`

use super::errors::QuireError;
use super::format::ExportFormat;
use super::ids::{ReportId, TaskId};
use super::result::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Progress recorded when a worker picks a task up
pub const PROGRESS_STARTED: f64 = 0.1;
/// Progress recorded once an exporter has been resolved
pub const PROGRESS_DISPATCHED: f64 = 0.3;
/// Progress recorded when the exporter returns
pub const PROGRESS_PRODUCED: f64 = 0.9;

// Upper bound for progress on a task that has not completed
const PROGRESS_CEILING: f64 = 0.99;

/// Lifecycle state of an export task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued, not yet picked up by a worker
    Pending,
    /// Owned by a worker
    InProgress,
    /// Output file written
    Completed,
    /// Export failed; see the error message
    Failed,
}

impl TaskStatus {
    /// Whether no further transitions can occur
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Canonical snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied export options
///
/// Well-known keys are typed; anything else is kept in `extra` and
/// serialized back as part of the same flat map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Document title, overriding the report title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Style rules appended after the default stylesheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,

    /// Output filename prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename_prefix: Option<String>,

    /// Template source used by the content renderer instead of the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Any other options
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExportOptions {
    /// Creates empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets custom style rules
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    /// Sets the filename prefix
    pub fn with_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = Some(prefix.into());
        self
    }

    /// Sets the renderer template
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Sets an arbitrary option
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Title to use, falling back to `default`
    pub fn title_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(default)
    }
}

/// Input handed to an exporter
#[derive(Debug, Clone, PartialEq)]
pub enum ExportPayload {
    /// Markup prepared at submission time
    Content(String),
    /// Raw structured report data
    Data(Value),
}

impl ExportPayload {
    /// Markup content, if this payload carries any
    pub fn content(&self) -> Option<&str> {
        match self {
            ExportPayload::Content(content) => Some(content),
            ExportPayload::Data(_) => None,
        }
    }

    /// Structured data, if this payload carries any
    pub fn data(&self) -> Option<&Value> {
        match self {
            ExportPayload::Content(_) => None,
            ExportPayload::Data(data) => Some(data),
        }
    }
}

/// Outcome of a single exporter invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportResult {
    /// Whether the file was produced
    pub success: bool,

    /// Path of the produced file
    pub file_path: Option<PathBuf>,

    /// Size of the produced file in bytes
    pub file_size: Option<u64>,

    /// Failure description
    pub error_message: Option<String>,

    /// Format-specific details (page count, sheet count, encoding, ...)
    pub metadata: Map<String, Value>,
}

impl ExportResult {
    /// Successful result
    pub fn success(file_path: PathBuf, file_size: u64, metadata: Map<String, Value>) -> Self {
        Self {
            success: true,
            file_path: Some(file_path),
            file_size: Some(file_size),
            error_message: None,
            metadata,
        }
    }

    /// Failed result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            file_path: None,
            file_size: None,
            error_message: Some(message.into()),
            metadata: Map::new(),
        }
    }
}

/// One export request and its tracked outcome
#[derive(Debug, Clone, Serialize)]
pub struct ExportTask {
    /// Task identifier
    pub id: TaskId,

    /// Report being exported
    pub report_id: ReportId,

    /// Output format
    pub format: ExportFormat,

    /// Caller options
    pub options: ExportOptions,

    /// Lifecycle state
    pub status: TaskStatus,

    /// Submission time
    pub created_at: DateTime<Utc>,

    /// When a worker picked the task up
    pub started_at: Option<DateTime<Utc>>,

    /// When the task reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,

    /// Output file, set once completed
    pub file_path: Option<PathBuf>,

    /// Failure description, set once failed
    pub error_message: Option<String>,

    /// Fraction complete in `[0.0, 1.0]`
    pub progress: f64,

    /// Output size in bytes, set once completed
    pub file_size: Option<u64>,

    /// Exporter metadata, set once completed
    pub metadata: Map<String, Value>,

    /// Output path resolved at submission
    pub destination: PathBuf,

    #[serde(skip)]
    payload: Arc<ExportPayload>,
}

impl ExportTask {
    /// Creates a pending task
    pub fn new(
        report_id: ReportId,
        format: ExportFormat,
        options: ExportOptions,
        destination: PathBuf,
        payload: ExportPayload,
    ) -> Self {
        Self {
            id: TaskId::generate(),
            report_id,
            format,
            options,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            file_path: None,
            error_message: None,
            progress: 0.0,
            file_size: None,
            metadata: Map::new(),
            destination,
            payload: Arc::new(payload),
        }
    }

    /// Exporter input
    pub fn payload(&self) -> Arc<ExportPayload> {
        Arc::clone(&self.payload)
    }

    /// Output path resolved at submission
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Whether the task has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Mark the task as picked up by a worker
    pub fn mark_started(&mut self) -> Result<()> {
        self.transition(TaskStatus::Pending, TaskStatus::InProgress)?;
        self.started_at = Some(Utc::now());
        self.progress = PROGRESS_STARTED;
        Ok(())
    }

    /// Record an intermediate progress milestone
    ///
    /// Progress never decreases and stays below `1.0` until completion.
    pub fn record_progress(&mut self, progress: f64) -> Result<()> {
        if self.status != TaskStatus::InProgress {
            return Err(QuireError::InvalidTransition {
                from: self.status,
                to: TaskStatus::InProgress,
            });
        }
        let bounded = progress.clamp(0.0, PROGRESS_CEILING);
        if bounded > self.progress {
            self.progress = bounded;
        }
        Ok(())
    }

    /// Mark the task as completed with its output file
    pub fn mark_completed(
        &mut self,
        file_path: PathBuf,
        file_size: Option<u64>,
        metadata: Map<String, Value>,
    ) -> Result<()> {
        self.transition(TaskStatus::InProgress, TaskStatus::Completed)?;
        self.file_path = Some(file_path);
        self.file_size = file_size;
        self.metadata = metadata;
        self.progress = 1.0;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the task as failed
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(TaskStatus::InProgress, TaskStatus::Failed)?;
        let message = message.into();
        self.error_message = Some(if message.trim().is_empty() {
            "Export failed".to_string()
        } else {
            message
        });
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Translate an exporter result into a terminal state
    pub fn apply_result(&mut self, result: ExportResult) -> Result<()> {
        match result {
            ExportResult {
                success: true,
                file_path: Some(path),
                file_size,
                metadata,
                ..
            } => self.mark_completed(path, file_size, metadata),
            ExportResult { success: true, .. } => {
                self.mark_failed("Exporter reported success without producing a file")
            }
            ExportResult { error_message, .. } => {
                self.mark_failed(error_message.unwrap_or_else(|| "Export failed".to_string()))
            }
        }
    }

    /// Caller-facing status projection
    pub fn status_view(&self) -> TaskStatusView {
        TaskStatusView {
            task_id: self.id,
            status: self.status,
            progress: self.progress,
            file_path: self.file_path.clone(),
            error_message: self.error_message.clone(),
        }
    }

    fn transition(&mut self, expected: TaskStatus, next: TaskStatus) -> Result<()> {
        if self.status != expected {
            return Err(QuireError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Status answer returned to polling callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatusView {
    /// Task identifier
    pub task_id: TaskId,
    /// Lifecycle state
    pub status: TaskStatus,
    /// Fraction complete
    pub progress: f64,
    /// Output file, when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    /// Failure description, when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pending_task() -> ExportTask {
        ExportTask::new(
            ReportId::new(1),
            ExportFormat::Html,
            ExportOptions::new().with_title("T"),
            PathBuf::from("/tmp/report_1.html"),
            ExportPayload::Content("<h1>T</h1>".to_string()),
        )
    }

    fn assert_invariants(task: &ExportTask) {
        assert_eq!(task.file_path.is_some(), task.status == TaskStatus::Completed);
        assert_eq!(task.error_message.is_some(), task.status == TaskStatus::Failed);
        assert_eq!(task.progress == 1.0, task.status == TaskStatus::Completed);
    }

    #[test]
    fn test_new_task_is_pending() {
        let task = pending_task();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0.0);
        assert!(task.started_at.is_none());
        assert_invariants(&task);
    }

    #[test]
    fn test_successful_lifecycle() {
        let mut task = pending_task();
        task.mark_started().unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.progress, PROGRESS_STARTED);
        assert!(task.started_at.is_some());
        assert_invariants(&task);

        task.record_progress(PROGRESS_DISPATCHED).unwrap();
        task.record_progress(PROGRESS_PRODUCED).unwrap();
        assert_eq!(task.progress, PROGRESS_PRODUCED);

        let mut metadata = Map::new();
        metadata.insert("format".to_string(), json!("html"));
        task.apply_result(ExportResult::success(
            PathBuf::from("/tmp/report_1.html"),
            120,
            metadata,
        ))
        .unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.file_size, Some(120));
        assert_eq!(task.metadata["format"], "html");
        assert!(task.completed_at.is_some());
        assert_invariants(&task);
    }

    #[test]
    fn test_failed_result() {
        let mut task = pending_task();
        task.mark_started().unwrap();
        task.apply_result(ExportResult::failure("disk full")).unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error_message.as_deref(), Some("disk full"));
        assert!(task.completed_at.is_some());
        assert_invariants(&task);
    }

    #[test]
    fn test_success_without_file_is_failure() {
        let mut task = pending_task();
        task.mark_started().unwrap();
        let mut result = ExportResult::success(PathBuf::from("x"), 1, Map::new());
        result.file_path = None;
        task.apply_result(result).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_invariants(&task);
    }

    #[test]
    fn test_empty_failure_message_is_replaced() {
        let mut task = pending_task();
        task.mark_started().unwrap();
        task.mark_failed("  ").unwrap();
        assert_eq!(task.error_message.as_deref(), Some("Export failed"));
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut task = pending_task();
        task.mark_started().unwrap();
        task.mark_failed("boom").unwrap();

        assert!(task.mark_started().is_err());
        assert!(task.mark_failed("again").is_err());
        assert!(task
            .mark_completed(PathBuf::from("x"), None, Map::new())
            .is_err());
        assert!(task.record_progress(0.5).is_err());
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_pending_cannot_complete_directly() {
        let mut task = pending_task();
        let err = task
            .mark_completed(PathBuf::from("x"), None, Map::new())
            .unwrap_err();
        assert!(matches!(
            err,
            QuireError::InvalidTransition {
                from: TaskStatus::Pending,
                to: TaskStatus::Completed
            }
        ));
    }

    #[test]
    fn test_progress_is_monotonic_and_below_one() {
        let mut task = pending_task();
        task.mark_started().unwrap();
        task.record_progress(0.5).unwrap();
        task.record_progress(0.2).unwrap();
        assert_eq!(task.progress, 0.5);
        task.record_progress(5.0).unwrap();
        assert!(task.progress < 1.0);
    }

    #[test]
    fn test_options_flatten_extra_keys() {
        let options: ExportOptions = serde_json::from_value(json!({
            "title": "Quarterly",
            "css": "h1 { color: red; }",
            "page_size": "A4"
        }))
        .unwrap();

        assert_eq!(options.title.as_deref(), Some("Quarterly"));
        assert_eq!(options.extra["page_size"], "A4");

        let back = serde_json::to_value(&options).unwrap();
        assert_eq!(back["page_size"], "A4");
        assert!(back.get("filename_prefix").is_none());
    }

    #[test]
    fn test_title_or_ignores_blank_titles() {
        let options = ExportOptions::new().with_title("   ");
        assert_eq!(options.title_or("Report"), "Report");
    }

    #[test]
    fn test_status_view_serialization() {
        let task = pending_task();
        let view = serde_json::to_value(task.status_view()).unwrap();
        assert_eq!(view["status"], "pending");
        assert!(view.get("file_path").is_none());
        assert!(view.get("error_message").is_none());
    }
}
