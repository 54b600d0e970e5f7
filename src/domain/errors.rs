//! Domain error types
//!
//! This module defines the error hierarchy for Quire. Submission-time errors
//! are returned to the caller before a task is queued; execution failures are
//! only ever recorded on the failed task.

use super::format::ExportFormat;
use super::ids::ReportId;
use super::task::TaskStatus;
use thiserror::Error;

/// Main Quire error type
///
/// This is the primary error type used throughout the library.
#[derive(Debug, Error)]
pub enum QuireError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An exporter's runtime capability is missing
    #[error("Export format '{format}' is unavailable: {reason}")]
    CapabilityUnavailable {
        /// Format whose exporter could not be constructed
        format: ExportFormat,
        /// Why the capability is absent
        reason: String,
    },

    /// The report provider could not resolve the report
    #[error("Report not found: {0}")]
    ReportNotFound(ReportId),

    /// The output directory could not be created or accessed
    #[error("Output directory error: {0}")]
    OutputDirectory(String),

    /// The requested format has no usable exporter
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(ExportFormat),

    /// Failure while producing an export file
    #[error("Export error: {0}")]
    Export(String),

    /// The task queue was stopped and accepts no new tasks
    #[error("Export queue is stopped and not accepting tasks")]
    QueueStopped,

    /// Workers from a previous run have not exited yet
    #[error("{0} export worker(s) from the previous run are still running")]
    WorkersStillRunning(usize),

    /// Illegal task state transition
    #[error("Invalid task transition from {from} to {to}")]
    InvalidTransition {
        /// State the task was in
        from: TaskStatus,
        /// State that was requested
        to: TaskStatus,
    },

    /// Content rendering errors
    #[error("Render error: {0}")]
    Render(String),

    /// Report provider errors
    #[error("Report provider error: {0}")]
    Provider(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl QuireError {
    /// Returns true for errors raised before a task is queued
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self,
            QuireError::ReportNotFound(_)
                | QuireError::OutputDirectory(_)
                | QuireError::UnsupportedFormat(_)
                | QuireError::Provider(_)
                | QuireError::QueueStopped
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for QuireError {
    fn from(err: std::io::Error) -> Self {
        QuireError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for QuireError {
    fn from(err: serde_json::Error) -> Self {
        QuireError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for QuireError {
    fn from(err: toml::de::Error) -> Self {
        QuireError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<minijinja::Error> for QuireError {
    fn from(err: minijinja::Error) -> Self {
        QuireError::Render(err.to_string())
    }
}

impl From<csv::Error> for QuireError {
    fn from(err: csv::Error) -> Self {
        QuireError::Export(format!("CSV write failed: {err}"))
    }
}

#[cfg(feature = "xlsx")]
impl From<rust_xlsxwriter::XlsxError> for QuireError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        QuireError::Export(format!("Workbook write failed: {err}"))
    }
}

#[cfg(feature = "pdf")]
impl From<printpdf::Error> for QuireError {
    fn from(err: printpdf::Error) -> Self {
        QuireError::Export(format!("PDF write failed: {err}"))
    }
}
