//! Raw data (JSON) exporter

use super::Exporter;
use crate::domain::{ExportFormat, ExportOptions, ExportPayload, QuireError, Result};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes report data as pretty-printed UTF-8 JSON
#[derive(Debug, Default)]
pub struct JsonExporter;

impl JsonExporter {
    /// Create a new JSON exporter
    pub fn new() -> Self {
        Self
    }
}

impl Exporter for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn write(
        &self,
        payload: &ExportPayload,
        destination: &Path,
        _options: &ExportOptions,
    ) -> Result<Map<String, Value>> {
        let data = payload.data().ok_or_else(|| {
            QuireError::Export("JSON export requires structured report data".to_string())
        })?;

        let mut writer = BufWriter::new(File::create(destination)?);
        serde_json::to_writer_pretty(&mut writer, data)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        let mut metadata = Map::new();
        metadata.insert("encoding".to_string(), Value::from("utf-8"));
        Ok(metadata)
    }
}
