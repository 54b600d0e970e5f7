//! Report data providers
//!
//! The engine never generates reports itself; it asks a [`ReportProvider`]
//! for the record belonging to a report id.

use crate::domain::{QuireError, ReportId, ReportRecord, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::path::Path;

/// Source of generated report records
#[async_trait]
pub trait ReportProvider: Send + Sync {
    /// Fetch a report by id
    ///
    /// Returns `Ok(None)` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be queried.
    async fn fetch_report(&self, report_id: ReportId) -> Result<Option<ReportRecord>>;
}

/// Reports held in memory
#[derive(Debug, Default)]
pub struct InMemoryReportProvider {
    reports: DashMap<ReportId, ReportRecord>,
}

impl InMemoryReportProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider holding `reports`
    pub fn with_reports(reports: impl IntoIterator<Item = ReportRecord>) -> Self {
        let provider = Self::new();
        for report in reports {
            provider.insert(report);
        }
        provider
    }

    /// Add or replace a report
    pub fn insert(&self, report: ReportRecord) {
        self.reports.insert(report.id, report);
    }

    /// Number of reports held
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Whether no reports are held
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Known report ids in ascending order
    pub fn report_ids(&self) -> Vec<ReportId> {
        let mut ids: Vec<ReportId> = self.reports.iter().map(|entry| *entry.key()).collect();
        ids.sort_by_key(ReportId::value);
        ids
    }
}

#[async_trait]
impl ReportProvider for InMemoryReportProvider {
    async fn fetch_report(&self, report_id: ReportId) -> Result<Option<ReportRecord>> {
        Ok(self.reports.get(&report_id).map(|entry| entry.value().clone()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReportFile {
    Many(Vec<ReportRecord>),
    One(ReportRecord),
}

/// Reports loaded from a JSON file
///
/// The file holds either one report record or an array of them.
#[derive(Debug)]
pub struct JsonFileReportProvider {
    inner: InMemoryReportProvider,
}

impl JsonFileReportProvider {
    /// Load reports from `path`
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::Provider`] if the file cannot be read or does
    /// not hold report records.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            QuireError::Provider(format!("Failed to read report file {}: {e}", path.display()))
        })?;

        let reports = match serde_json::from_str::<ReportFile>(&contents).map_err(|e| {
            QuireError::Provider(format!("Invalid report file {}: {e}", path.display()))
        })? {
            ReportFile::Many(reports) => reports,
            ReportFile::One(report) => vec![report],
        };

        tracing::debug!(
            path = %path.display(),
            reports = reports.len(),
            "Loaded report file"
        );

        Ok(Self {
            inner: InMemoryReportProvider::with_reports(reports),
        })
    }

    /// Known report ids in ascending order
    pub fn report_ids(&self) -> Vec<ReportId> {
        self.inner.report_ids()
    }
}

#[async_trait]
impl ReportProvider for JsonFileReportProvider {
    async fn fetch_report(&self, report_id: ReportId) -> Result<Option<ReportRecord>> {
        self.inner.fetch_report(report_id).await
    }
}
