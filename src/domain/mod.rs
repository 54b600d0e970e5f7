//! Domain models and types for Quire.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`TaskId`], [`ReportId`])
//! - **Export model** ([`ExportTask`], [`ExportResult`], [`ExportOptions`], [`ExportPayload`])
//! - **Formats** ([`ExportFormat`])
//! - **Report records** ([`ReportRecord`]) supplied by the reporting application
//! - **Error types** ([`QuireError`]) and the [`Result`] alias
//!
//! # Task lifecycle
//!
//! ```rust
//! use quire::domain::{ExportFormat, ExportOptions, ExportPayload, ExportTask, ReportId, TaskStatus};
//! use std::path::PathBuf;
//!
//! # fn example() -> quire::domain::Result<()> {
//! let mut task = ExportTask::new(
//!     ReportId::new(7),
//!     ExportFormat::Html,
//!     ExportOptions::new().with_title("T"),
//!     PathBuf::from("exports/report_7_20240115_103000.html"),
//!     ExportPayload::Content("<h1>T</h1>".to_string()),
//! );
//!
//! task.mark_started()?;
//! task.mark_failed("disk full")?;
//! assert_eq!(task.status, TaskStatus::Failed);
//!
//! // Terminal states never transition again
//! assert!(task.mark_started().is_err());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod format;
pub mod ids;
pub mod report;
pub mod result;
pub mod task;

// Re-export commonly used types for convenience
pub use errors::QuireError;
pub use format::ExportFormat;
pub use ids::{ReportId, TaskId};
pub use report::ReportRecord;
pub use result::Result;
pub use task::{
    ExportOptions, ExportPayload, ExportResult, ExportTask, TaskStatus, TaskStatusView,
};
