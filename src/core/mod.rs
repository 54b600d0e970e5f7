//! Core export engine.
//!
//! # Modules
//!
//! - [`export`] - The [`ExportManager`](export::ExportManager) callers talk to
//! - [`exporters`] - One exporter per output format
//! - [`queue`] - Task registry and the bounded worker pool
//!
//! # Export Workflow
//!
//! 1. **Submit**: the manager fetches the report and renders markup content
//! 2. **Name**: a unique output path is reserved in the output directory
//! 3. **Queue**: the task is registered as pending and its id enqueued
//! 4. **Export**: a worker runs the format's exporter on the blocking pool
//! 5. **Record**: the task becomes completed or failed and waiters wake up
//!
//! # Example
//!
//! ```rust,no_run
//! use quire::adapters::JsonFileReportProvider;
//! use quire::config::load_config;
//! use quire::core::export::ExportManager;
//! use quire::domain::{ExportFormat, ExportOptions, ReportId};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("quire.toml")?;
//! let provider = Arc::new(JsonFileReportProvider::load("reports.json").await?);
//!
//! let manager = ExportManager::new(config.export, provider).await?;
//! let task_id = manager
//!     .export_report(ReportId::new(7), ExportFormat::Pdf, ExportOptions::new())
//!     .await?;
//!
//! if let Some(task) = manager.wait_for_export(task_id, Duration::from_secs(30)).await {
//!     println!("{}: {:?}", task.status, task.file_path);
//! }
//!
//! manager.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod exporters;
pub mod queue;
