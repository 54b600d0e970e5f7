//! Integration tests for the export manager
//!
//! These tests verify that:
//! - Submissions return immediately and complete in the background
//! - Completed tasks always point at a non-empty file
//! - Failed tasks carry an error and no file
//! - Unknown reports are rejected without creating a task

use quire::adapters::InMemoryReportProvider;
use quire::config::ExportConfig;
use quire::core::export::{ContentRenderer, ExportManager};
use quire::core::exporters::Capabilities;
use quire::domain::{
    ExportFormat, ExportOptions, ExportTask, QuireError, ReportId, ReportRecord, Result,
    TaskStatus,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(10);

fn config(dir: &TempDir) -> ExportConfig {
    ExportConfig {
        output_dir: dir.path().join("exports"),
        queue_timeout_ms: 50,
        ..ExportConfig::default()
    }
}

fn provider() -> Arc<InMemoryReportProvider> {
    Arc::new(InMemoryReportProvider::with_reports([
        ReportRecord::new(ReportId::new(7), "T").with_report_type("test_summary"),
        ReportRecord::new(ReportId::new(8), "R").with_data(json!({
            "total_test_cases": 3,
            "passed_count": 2,
            "failed_count": 1,
            "pass_rate": 0.6667,
            "test_cases": [
                {"id": 1, "title": "Login", "status": "passed"},
                {"id": 2, "title": "Logout", "status": "passed"},
                {"id": 3, "title": "Reset", "status": "failed"}
            ]
        })),
    ]))
}

fn assert_task_invariants(task: &ExportTask) {
    assert_eq!(task.file_path.is_some(), task.status == TaskStatus::Completed);
    assert_eq!(task.error_message.is_some(), task.status == TaskStatus::Failed);
    assert_eq!(task.progress == 1.0, task.status == TaskStatus::Completed);

    if let Some(path) = &task.file_path {
        let size = std::fs::metadata(path).expect("completed file exists").len();
        assert!(size > 0, "completed file is empty");
        assert_eq!(task.file_size, Some(size));
    }
}

#[tokio::test]
async fn test_html_export_of_report_seven() {
    let dir = TempDir::new().unwrap();
    let manager = ExportManager::new(config(&dir), provider()).await.unwrap();

    let task_id = manager
        .export_report(
            ReportId::new(7),
            ExportFormat::Html,
            ExportOptions::new().with_title("T"),
        )
        .await
        .unwrap();

    let status = manager.status(task_id).expect("task is tracked");
    assert!(matches!(
        status.status,
        TaskStatus::Pending | TaskStatus::InProgress | TaskStatus::Completed
    ));

    let task = manager.wait_for_export(task_id, WAIT).await.unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_task_invariants(&task);
    assert!(task.started_at.is_some());
    assert!(task.completed_at.is_some());

    let path = task.file_path.unwrap();
    let name = path.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("report_7_"), "unexpected name {name}");
    assert!(name.ends_with(".html"));
    assert_eq!(path.parent(), Some(manager.output_dir()));

    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>T</title>"));
    assert!(html.contains("<h1>T</h1>"));
    assert_eq!(task.metadata["format"], "html");

    manager.shutdown().await;
}

#[tokio::test]
async fn test_html_round_trip_contains_title() {
    let dir = TempDir::new().unwrap();
    let manager = ExportManager::new(config(&dir), provider()).await.unwrap();

    let task_id = manager
        .export_report(ReportId::new(8), ExportFormat::Html, ExportOptions::new())
        .await
        .unwrap();
    let task = manager.wait_for_export(task_id, WAIT).await.unwrap();

    assert_eq!(task.status, TaskStatus::Completed);
    let html = std::fs::read_to_string(task.file_path.unwrap()).unwrap();
    assert!(html.contains("R"));
    assert!(html.contains("<td>Total test cases</td><td>3</td>"));

    manager.shutdown().await;
}

#[tokio::test]
async fn test_data_formats_complete() {
    let dir = TempDir::new().unwrap();
    let manager = ExportManager::new(config(&dir), provider()).await.unwrap();

    let mut ids = Vec::new();
    for format in [ExportFormat::Json, ExportFormat::Csv] {
        ids.push(
            manager
                .export_report(ReportId::new(8), format, ExportOptions::new())
                .await
                .unwrap(),
        );
    }

    for id in ids {
        let task = manager.wait_for_export(id, WAIT).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed, "{:?}", task.error_message);
        assert_task_invariants(&task);
    }

    manager.shutdown().await;
}

#[tokio::test]
async fn test_json_export_contains_report_fields() {
    let dir = TempDir::new().unwrap();
    let manager = ExportManager::new(config(&dir), provider()).await.unwrap();

    let task_id = manager
        .export_report(ReportId::new(8), ExportFormat::Json, ExportOptions::new())
        .await
        .unwrap();
    let task = manager.wait_for_export(task_id, WAIT).await.unwrap();

    let data: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(task.file_path.unwrap()).unwrap())
            .unwrap();
    assert_eq!(data["id"], 8);
    assert_eq!(data["title"], "R");
    assert_eq!(data["total_test_cases"], 3);

    manager.shutdown().await;
}

#[cfg(feature = "xlsx")]
#[tokio::test]
async fn test_spreadsheet_export() {
    let dir = TempDir::new().unwrap();
    let manager = ExportManager::new(config(&dir), provider()).await.unwrap();

    let task_id = manager
        .export_report(ReportId::new(8), ExportFormat::Excel, ExportOptions::new())
        .await
        .unwrap();
    let task = manager.wait_for_export(task_id, WAIT).await.unwrap();

    assert_eq!(task.status, TaskStatus::Completed, "{:?}", task.error_message);
    assert_task_invariants(&task);
    let path = task.file_path.unwrap();
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));
    // xlsx files are zip archives
    assert!(std::fs::read(&path).unwrap().starts_with(b"PK"));
    assert_eq!(task.metadata["sheets"], 2);

    manager.shutdown().await;
}

#[cfg(feature = "pdf")]
#[tokio::test]
async fn test_paginated_export() {
    let dir = TempDir::new().unwrap();
    let manager = ExportManager::new(config(&dir), provider()).await.unwrap();

    let task_id = manager
        .export_report(ReportId::new(8), ExportFormat::Pdf, ExportOptions::new())
        .await
        .unwrap();
    let task = manager.wait_for_export(task_id, WAIT).await.unwrap();

    assert_eq!(task.status, TaskStatus::Completed, "{:?}", task.error_message);
    assert_task_invariants(&task);
    assert!(std::fs::read(task.file_path.unwrap())
        .unwrap()
        .starts_with(b"%PDF"));
    assert!(task.metadata["pages"].as_u64().unwrap() >= 1);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_unknown_report_creates_no_task() {
    let dir = TempDir::new().unwrap();
    let manager = ExportManager::new(config(&dir), provider()).await.unwrap();

    let err = manager
        .export_report(ReportId::new(404), ExportFormat::Pdf, ExportOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, QuireError::ReportNotFound(_)));
    assert!(err.is_submission_error());
    let stats = manager.stats();
    assert_eq!(stats.pending + stats.in_progress + stats.completed + stats.failed, 0);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_unavailable_format_fails_in_worker() {
    let dir = TempDir::new().unwrap();
    let manager = ExportManager::builder(config(&dir), provider())
        .capabilities(Capabilities::detect().without_paginated())
        .build()
        .await
        .unwrap();

    assert!(!manager.get_supported_formats().contains(&ExportFormat::Pdf));

    let task_id = manager
        .export_report(ReportId::new(7), ExportFormat::Pdf, ExportOptions::new())
        .await
        .unwrap();
    let task = manager.wait_for_export(task_id, WAIT).await.unwrap();

    assert_eq!(task.status, TaskStatus::Failed);
    assert_task_invariants(&task);
    assert!(task
        .error_message
        .unwrap()
        .contains("Unsupported export format"));

    manager.shutdown().await;
}

struct FailingRenderer;

impl ContentRenderer for FailingRenderer {
    fn render(&self, _report: &ReportRecord, _options: &ExportOptions) -> Result<String> {
        Err(QuireError::Render("template missing".to_string()))
    }
}

#[tokio::test]
async fn test_custom_renderer_errors_are_returned() {
    let dir = TempDir::new().unwrap();
    let manager = ExportManager::builder(config(&dir), provider())
        .renderer(Arc::new(FailingRenderer))
        .build()
        .await
        .unwrap();

    let err = manager
        .export_report(ReportId::new(7), ExportFormat::Html, ExportOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, QuireError::Render(_)));

    // Data formats do not use the renderer
    let task_id = manager
        .export_report(ReportId::new(7), ExportFormat::Json, ExportOptions::new())
        .await
        .unwrap();
    let task = manager.wait_for_export(task_id, WAIT).await.unwrap();
    assert_eq!(task.status, TaskStatus::Completed);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_same_second_submissions_get_distinct_files() {
    let dir = TempDir::new().unwrap();
    let manager = ExportManager::new(config(&dir), provider()).await.unwrap();

    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(
            manager
                .export_report(ReportId::new(7), ExportFormat::Html, ExportOptions::new())
                .await
                .unwrap(),
        );
    }

    let mut paths = Vec::new();
    for id in ids {
        let task = manager.wait_for_export(id, WAIT).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        paths.push(task.file_path.unwrap());
    }
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 4);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_caller_prefix_is_used() {
    let dir = TempDir::new().unwrap();
    let manager = ExportManager::new(config(&dir), provider()).await.unwrap();

    let task_id = manager
        .export_report(
            ReportId::new(7),
            ExportFormat::Csv,
            ExportOptions::new().with_filename_prefix("weekly"),
        )
        .await
        .unwrap();
    let task = manager.wait_for_export(task_id, WAIT).await.unwrap();

    let name = task
        .file_path
        .unwrap()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(name.starts_with("weekly_7_"));
    assert!(name.ends_with(".csv"));

    manager.shutdown().await;
}

#[tokio::test]
async fn test_output_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let config = ExportConfig {
        output_dir: dir.path().join("nested").join("deeper"),
        ..ExportConfig::default()
    };
    let manager = ExportManager::new(config, provider()).await.unwrap();
    assert!(manager.output_dir().is_dir());
    manager.shutdown().await;
}

#[tokio::test]
async fn test_uncreatable_output_directory() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();

    let config = ExportConfig {
        output_dir: blocker.join("exports"),
        ..ExportConfig::default()
    };
    let result = ExportManager::new(config, provider()).await;
    assert!(matches!(result, Err(QuireError::OutputDirectory(_))));
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let manager = ExportManager::new(config(&dir), provider()).await.unwrap();
    manager.shutdown().await;
    manager.shutdown().await;
    assert_eq!(manager.stats().workers, 0);

    let err = manager
        .export_report(ReportId::new(7), ExportFormat::Html, ExportOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, QuireError::QueueStopped));
}
