//! Configuration management for Quire.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! Quire uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for every setting
//! - `QUIRE_<SECTION>_<KEY>` environment overrides
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use quire::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("quire.toml")?;
//!
//! println!("Output directory: {}", config.export.output_dir.display());
//! println!("Workers: {}", config.export.max_workers);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`ExportConfig`] - Output directory, worker pool, filenames, retention
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [export]
//! output_dir = "${QUIRE_OUTPUT_DIR}"
//! max_workers = 3
//! queue_timeout_ms = 1000
//! shutdown_timeout_secs = 5
//! filename_prefix = "report"
//! task_retention_secs = 3600
//!
//! [logging]
//! local_enabled = true
//! local_path = "logs"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, load_config_str};
pub use schema::{ApplicationConfig, ExportConfig, LoggingConfig, QuireConfig};
