// Quire - Asynchronous Report Export Engine
// Copyright (c) 2025 Quire Contributors
// Licensed under the MIT License

//! # Quire - Asynchronous Report Export Engine
//!
//! Quire turns generated reports into files (HTML, PDF, Excel, JSON or CSV)
//! without blocking the caller. Submissions return a task id immediately; a
//! bounded pool of workers produces the files and records each task's
//! outcome for polling or waiting.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export manager, exporters and the worker pool
//! - [`adapters`] - Report providers
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quire::adapters::InMemoryReportProvider;
//! use quire::config::ExportConfig;
//! use quire::core::export::ExportManager;
//! use quire::domain::{ExportFormat, ExportOptions, ReportId, ReportRecord, TaskStatus};
//! use serde_json::json;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Arc::new(InMemoryReportProvider::with_reports([
//!         ReportRecord::new(ReportId::new(7), "Nightly regression")
//!             .with_data(json!({"total_test_cases": 3, "passed_count": 2})),
//!     ]));
//!
//!     let manager = ExportManager::new(ExportConfig::default(), provider).await?;
//!     let task_id = manager
//!         .export_report(ReportId::new(7), ExportFormat::Html, ExportOptions::new())
//!         .await?;
//!
//!     // Poll without blocking...
//!     println!("{:?}", manager.status(task_id));
//!
//!     // ...or wait for the outcome
//!     if let Some(task) = manager.wait_for_export(task_id, Duration::from_secs(10)).await {
//!         assert_eq!(task.status, TaskStatus::Completed);
//!         println!("Written to {:?}", task.file_path);
//!     }
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Output formats
//!
//! HTML, JSON and CSV are always available. PDF and Excel depend on the `pdf`
//! and `xlsx` cargo features; [`core::export::ExportManager::get_supported_formats`]
//! lists what this build can produce.
//!
//! ## Error Handling
//!
//! Quire uses the [`domain::QuireError`] type for all errors. Errors that
//! prevent a submission (unknown report, unusable output directory) are
//! returned from the call; failures while producing a file are recorded on
//! the task instead.
//!
//! ## Logging
//!
//! Quire uses structured logging with the `tracing` crate; see
//! [`logging::init_logging`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
