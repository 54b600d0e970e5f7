//! Configuration schema types
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound on the worker pool size
pub const MAX_WORKERS: usize = 64;

/// Main Quire configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuireConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Export engine settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl QuireConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Export engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving export files (created on startup)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Number of concurrent export workers
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// How long an idle worker waits for work before housekeeping, in
    /// milliseconds. Also bounds how quickly an idle worker notices a stop.
    #[serde(default = "default_queue_timeout_ms")]
    pub queue_timeout_ms: u64,

    /// Maximum time to wait for workers to exit on shutdown, in seconds
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Filename prefix used when the caller does not supply one
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,

    /// How long finished tasks remain queryable, in seconds
    #[serde(default = "default_task_retention_secs")]
    pub task_retention_secs: u64,

    /// Default age threshold for `cleanup`, in days
    #[serde(default = "default_cleanup_max_age_days")]
    pub cleanup_max_age_days: u64,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.as_os_str().is_empty() {
            return Err("export.output_dir cannot be empty".to_string());
        }

        if self.max_workers == 0 || self.max_workers > MAX_WORKERS {
            return Err(format!(
                "export.max_workers must be between 1 and {MAX_WORKERS}, got {}",
                self.max_workers
            ));
        }

        if self.queue_timeout_ms == 0 {
            return Err("export.queue_timeout_ms must be > 0".to_string());
        }

        if self.shutdown_timeout_secs == 0 {
            return Err("export.shutdown_timeout_secs must be > 0".to_string());
        }

        if !is_valid_prefix(&self.filename_prefix) {
            return Err(format!(
                "Invalid export.filename_prefix '{}'. Use letters, digits, '-' or '_'",
                self.filename_prefix
            ));
        }

        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_workers: default_max_workers(),
            queue_timeout_ms: default_queue_timeout_ms(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            filename_prefix: default_filename_prefix(),
            task_retention_secs: default_task_retention_secs(),
            cleanup_max_age_days: default_cleanup_max_age_days(),
        }
    }
}

/// Whether `prefix` is safe to embed in a filename
pub fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_max_workers() -> usize {
    3
}

fn default_queue_timeout_ms() -> u64 {
    1000
}

fn default_shutdown_timeout_secs() -> u64 {
    5
}

fn default_filename_prefix() -> String {
    "report".to_string()
}

fn default_task_retention_secs() -> u64 {
    3600
}

fn default_cleanup_max_age_days() -> u64 {
    7
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_config_validation() {
        let mut config = ExportConfig::default();
        assert!(config.validate().is_ok());

        config.max_workers = 0;
        assert!(config.validate().is_err());

        config.max_workers = MAX_WORKERS + 1;
        assert!(config.validate().is_err());

        config.max_workers = 4;
        config.queue_timeout_ms = 0;
        assert!(config.validate().is_err());

        config.queue_timeout_ms = 250;
        config.shutdown_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.shutdown_timeout_secs = 10;
        config.output_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test_case("report", true; "default prefix")]
    #[test_case("qa-weekly_2", true; "dash and underscore")]
    #[test_case("", false; "empty")]
    #[test_case("../escape", false; "path traversal")]
    #[test_case("with space", false; "whitespace")]
    fn test_filename_prefix(prefix: &str, valid: bool) {
        assert_eq!(is_valid_prefix(prefix), valid);
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.local_enabled);
        assert_eq!(config.local_path, "logs");
        assert_eq!(config.local_rotation, "daily");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_rotation_validation() {
        let config = LoggingConfig {
            local_rotation: "size".to_string(),
            ..LoggingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_values() {
        let config = QuireConfig::default();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.export.output_dir, PathBuf::from("exports"));
        assert_eq!(config.export.max_workers, 3);
        assert_eq!(config.export.queue_timeout_ms, 1000);
        assert_eq!(config.export.shutdown_timeout_secs, 5);
        assert_eq!(config.export.filename_prefix, "report");
        assert_eq!(config.export.task_retention_secs, 3600);
        assert_eq!(config.export.cleanup_max_age_days, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: QuireConfig = toml::from_str("").unwrap();
        assert_eq!(config, QuireConfig::default());
    }
}
