//! Comma-separated values exporter
//!
//! The first tabular collection found in the data (`test_cases`, then
//! `defects`, then `coverage_data`) is written as a table. Data without one
//! is written as `field,value` pairs of its top-level scalars.

use super::Exporter;
use crate::domain::{ExportFormat, ExportOptions, ExportPayload, QuireError, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// Collections written as tables, in order of preference
pub const TABLE_SOURCES: [&str; 3] = ["test_cases", "defects", "coverage_data"];

/// Writes report data as CSV
#[derive(Debug, Default)]
pub struct CsvExporter;

impl CsvExporter {
    /// Create a new CSV exporter
    pub fn new() -> Self {
        Self
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Union of object keys across `rows`, in first-seen order
pub fn header_for(rows: &[Value]) -> Vec<String> {
    let mut header: Vec<String> = Vec::new();
    for key in rows.iter().filter_map(Value::as_object).flat_map(Map::keys) {
        if !header.iter().any(|k| k == key) {
            header.push(key.clone());
        }
    }
    header
}

fn write_table<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    rows: &[Value],
) -> Result<usize> {
    let header = header_for(rows);
    writer.write_record(&header)?;

    let mut written = 0;
    for row in rows {
        let record: Vec<String> = header
            .iter()
            .map(|key| row.get(key).map(field_text).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
        written += 1;
    }
    Ok(written)
}

fn write_fields<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    data: &Map<String, Value>,
) -> Result<usize> {
    writer.write_record(["field", "value"])?;

    let mut written = 0;
    for (key, value) in data {
        if value.is_array() || value.is_object() {
            continue;
        }
        writer.write_record([key.as_str(), field_text(value).as_str()])?;
        written += 1;
    }
    Ok(written)
}

impl Exporter for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn write(
        &self,
        payload: &ExportPayload,
        destination: &Path,
        _options: &ExportOptions,
    ) -> Result<Map<String, Value>> {
        let data = payload
            .data()
            .and_then(Value::as_object)
            .ok_or_else(|| {
                QuireError::Export("CSV export requires structured report data".to_string())
            })?;

        let table = TABLE_SOURCES
            .iter()
            .find_map(|source| data.get(*source).and_then(Value::as_array).map(|rows| (*source, rows)));

        let mut writer = csv::Writer::from_path(destination)?;
        let (source, rows) = match table {
            Some((source, rows)) => (source, write_table(&mut writer, rows)?),
            None => ("fields", write_fields(&mut writer, data)?),
        };
        writer.flush()?;

        tracing::debug!(source, rows, "CSV rows written");

        let mut metadata = Map::new();
        metadata.insert("rows".to_string(), Value::from(rows));
        metadata.insert("source".to_string(), Value::from(source));
        Ok(metadata)
    }
}
