//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels (with `RUST_LOG` precedence)
//! - Console output on stderr
//! - JSON-formatted local file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use quire::logging::init_logging;
//! use quire::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export task
///
/// # Example
///
/// ```no_run
/// use quire::log_export_start;
/// use quire::domain::{ExportFormat, ReportId, TaskId};
///
/// log_export_start!(0usize, TaskId::generate(), ReportId::new(7), ExportFormat::Html);
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($worker:expr, $task_id:expr, $report_id:expr, $format:expr) => {
        tracing::info!(
            worker = $worker,
            task_id = %$task_id,
            report_id = %$report_id,
            format = %$format,
            "Processing export task"
        );
    };
}

/// Log the terminal outcome of an export task
///
/// # Example
///
/// ```no_run
/// use quire::log_export_complete;
/// use quire::domain::TaskId;
/// use std::time::Duration;
///
/// log_export_complete!(TaskId::generate(), true, Duration::from_millis(120));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($task_id:expr, $success:expr, $duration:expr) => {
        if $success {
            tracing::info!(
                task_id = %$task_id,
                duration_ms = $duration.as_millis() as u64,
                "Export task completed"
            );
        } else {
            tracing::warn!(
                task_id = %$task_id,
                duration_ms = $duration.as_millis() as u64,
                "Export task failed"
            );
        }
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use quire::log_error_with_context;
/// use quire::domain::QuireError;
///
/// let error = QuireError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
