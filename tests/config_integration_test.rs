//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables hold `ENV_MUTEX` to avoid
//! interference between tests.

use quire::config::{load_config, QuireConfig};
use quire::core::queue::QueueSettings;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("QUIRE_APPLICATION_LOG_LEVEL");
    std::env::remove_var("QUIRE_EXPORT_MAX_WORKERS");
    std::env::remove_var("QUIRE_EXPORT_OUTPUT_DIR");
    std::env::remove_var("QUIRE_EXPORT_FILENAME_PREFIX");
    std::env::remove_var("QUIRE_LOGGING_LOCAL_ENABLED");
    std::env::remove_var("TEST_QUIRE_EXPORT_ROOT");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(contents.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[application]
log_level = "debug"

[export]
output_dir = "/var/lib/quire/exports"
max_workers = 8
queue_timeout_ms = 250
shutdown_timeout_secs = 10
filename_prefix = "qa-nightly"
task_retention_secs = 600
cleanup_max_age_days = 30

[logging]
local_enabled = true
local_path = "/tmp/quire-logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");

    assert_eq!(config.export.output_dir, PathBuf::from("/var/lib/quire/exports"));
    assert_eq!(config.export.max_workers, 8);
    assert_eq!(config.export.queue_timeout_ms, 250);
    assert_eq!(config.export.shutdown_timeout_secs, 10);
    assert_eq!(config.export.filename_prefix, "qa-nightly");
    assert_eq!(config.export.task_retention_secs, 600);
    assert_eq!(config.export.cleanup_max_age_days, 30);

    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_path, "/tmp/quire-logs");
    assert_eq!(config.logging.local_rotation, "hourly");

    let settings = QueueSettings::from_config(&config.export);
    assert_eq!(settings.workers, 8);
    assert_eq!(settings.queue_timeout, Duration::from_millis(250));
    assert_eq!(settings.shutdown_timeout, Duration::from_secs(10));
    assert_eq!(settings.task_retention, Duration::from_secs(600));
}

#[test]
fn test_load_empty_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("# nothing configured\n");
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config, QuireConfig::default());
    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.export.output_dir, PathBuf::from("exports"));
    assert_eq!(config.export.max_workers, 3);
    assert_eq!(config.export.filename_prefix, "report");
    assert!(!config.logging.local_enabled);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_QUIRE_EXPORT_ROOT", "/srv/reports");

    let temp_file = write_config(
        r#"
[export]
output_dir = "${TEST_QUIRE_EXPORT_ROOT}/out"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");
    assert_eq!(config.export.output_dir, PathBuf::from("/srv/reports/out"));

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[export]
output_dir = "${TEST_QUIRE_EXPORT_ROOT}/out"
"#,
    );

    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_QUIRE_EXPORT_ROOT"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("QUIRE_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("QUIRE_EXPORT_MAX_WORKERS", "6");
    std::env::set_var("QUIRE_EXPORT_FILENAME_PREFIX", "override");
    std::env::set_var("QUIRE_LOGGING_LOCAL_ENABLED", "true");

    let temp_file = write_config(
        r#"
[application]
log_level = "info"

[export]
max_workers = 2
filename_prefix = "file"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.export.max_workers, 6);
    assert_eq!(config.export.filename_prefix, "override");
    assert!(config.logging.local_enabled);

    cleanup_env_vars();
}

#[test]
fn test_unparsable_override_is_ignored() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("QUIRE_EXPORT_MAX_WORKERS", "many");

    let temp_file = write_config("[export]\nmax_workers = 4\n");
    let config = load_config(temp_file.path()).expect("Failed to load config");
    assert_eq!(config.export.max_workers, 4);

    cleanup_env_vars();
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    for contents in [
        "[application]\nlog_level = \"loud\"\n",
        "[export]\nmax_workers = 0\n",
        "[export]\nfilename_prefix = \"a/b\"\n",
        "[logging]\nlocal_rotation = \"size\"\n",
        "[export\n",
    ] {
        let temp_file = write_config(contents);
        assert!(
            load_config(temp_file.path()).is_err(),
            "expected rejection of {contents:?}"
        );
    }
}
