//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::QuireConfig;
use crate::domain::errors::QuireError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into QuireConfig
/// 4. Applies environment variable overrides (QUIRE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`QuireError::Configuration`] if the file cannot be read or
/// parsed, a referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use quire::config::loader::load_config;
///
/// let config = load_config("quire.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<QuireConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(QuireError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        QuireError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_str(&contents)
}

/// Loads configuration from TOML text
///
/// Applies the same substitution, overrides and validation as
/// [`load_config`].
///
/// # Errors
///
/// Returns [`QuireError::Configuration`] on any failure.
pub fn load_config_str(contents: &str) -> Result<QuireConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: QuireConfig = toml::from_str(&contents)
        .map_err(|e| QuireError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        QuireError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| QuireError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for (index, line) in input.lines().enumerate() {
        if index > 0 {
            result.push('\n');
        }

        if line.trim_start().starts_with('#') {
            result.push_str(line);
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    cap[0].to_string()
                }
            }
        });
        result.push_str(&processed);
    }

    if !missing_vars.is_empty() {
        return Err(QuireError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparsable override");
            None
        }
    }
}

/// Applies environment variable overrides using QUIRE_* prefix
///
/// Environment variables follow the pattern: QUIRE_<SECTION>_<KEY>
/// For example: QUIRE_EXPORT_MAX_WORKERS, QUIRE_APPLICATION_LOG_LEVEL
fn apply_env_overrides(config: &mut QuireConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("QUIRE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Export overrides
    if let Ok(val) = std::env::var("QUIRE_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = PathBuf::from(val);
    }
    if let Some(workers) = env_parsed("QUIRE_EXPORT_MAX_WORKERS") {
        config.export.max_workers = workers;
    }
    if let Some(timeout) = env_parsed("QUIRE_EXPORT_QUEUE_TIMEOUT_MS") {
        config.export.queue_timeout_ms = timeout;
    }
    if let Some(timeout) = env_parsed("QUIRE_EXPORT_SHUTDOWN_TIMEOUT_SECS") {
        config.export.shutdown_timeout_secs = timeout;
    }
    if let Ok(val) = std::env::var("QUIRE_EXPORT_FILENAME_PREFIX") {
        config.export.filename_prefix = val;
    }
    if let Some(retention) = env_parsed("QUIRE_EXPORT_TASK_RETENTION_SECS") {
        config.export.task_retention_secs = retention;
    }
    if let Some(days) = env_parsed("QUIRE_EXPORT_CLEANUP_MAX_AGE_DAYS") {
        config.export.cleanup_max_age_days = days;
    }

    // Logging overrides
    if let Some(enabled) = env_parsed("QUIRE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("QUIRE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("QUIRE_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}
