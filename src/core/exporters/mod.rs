//! Per-format export strategies
//!
//! Every output format is produced by an [`Exporter`]. Exporters are plain
//! synchronous functions of `(payload, destination, options)`; the task queue
//! runs them on the blocking thread pool. The [`ExporterSet`] owns one
//! exporter per format and resolves a format with an exhaustive match.
//!
//! Exporters whose runtime capability is missing (the `pdf` and `xlsx`
//! cargo features, or a capability switched off through [`Capabilities`])
//! fail at construction. The set simply leaves them out, which shrinks
//! [`ExporterSet::supported_formats`].

pub mod delimited;
pub mod json;
pub mod markup;
pub mod paginated;
pub mod spreadsheet;

pub use delimited::CsvExporter;
pub use json::JsonExporter;
pub use markup::HtmlExporter;
pub use paginated::PdfExporter;
pub use spreadsheet::SpreadsheetExporter;

use crate::domain::{ExportFormat, ExportOptions, ExportPayload, ExportResult, Result};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Shared capability of all exporters
pub trait Exporter: Send + Sync {
    /// Format this exporter produces
    fn format(&self) -> ExportFormat;

    /// Write the output file and return format-specific metadata
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is unsuitable or the file cannot be
    /// written.
    fn write(
        &self,
        payload: &ExportPayload,
        destination: &Path,
        options: &ExportOptions,
    ) -> Result<Map<String, Value>>;

    /// Produce the export, converting any failure into an unsuccessful result
    fn produce(
        &self,
        payload: &ExportPayload,
        destination: &Path,
        options: &ExportOptions,
    ) -> ExportResult {
        let format = self.format();
        let outcome = self
            .write(payload, destination, options)
            .and_then(|metadata| Ok((metadata, std::fs::metadata(destination)?.len())));

        match outcome {
            Ok((mut metadata, file_size)) => {
                metadata
                    .entry("format")
                    .or_insert_with(|| Value::from(format.as_str()));
                metadata
                    .entry("generated_at")
                    .or_insert_with(|| Value::from(Utc::now().to_rfc3339()));
                tracing::debug!(
                    format = %format,
                    path = %destination.display(),
                    file_size,
                    "Export file written"
                );
                ExportResult::success(destination.to_path_buf(), file_size, metadata)
            }
            Err(e) => {
                tracing::error!(
                    format = %format,
                    path = %destination.display(),
                    error = %e,
                    "Export failed"
                );
                ExportResult::failure(format!("{} export failed: {e}", format.as_str().to_uppercase()))
            }
        }
    }
}

/// Runtime capabilities available to optional exporters
///
/// [`Capabilities::detect`] reports what was compiled in. Capabilities can
/// only be narrowed afterwards, which is how callers simulate a missing
/// renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    paginated: bool,
    spreadsheet: bool,
}

impl Capabilities {
    /// Capabilities compiled into this build
    pub fn detect() -> Self {
        Self {
            paginated: cfg!(feature = "pdf"),
            spreadsheet: cfg!(feature = "xlsx"),
        }
    }

    /// Disable the paginated document renderer
    pub fn without_paginated(mut self) -> Self {
        self.paginated = false;
        self
    }

    /// Disable the spreadsheet builder
    pub fn without_spreadsheet(mut self) -> Self {
        self.spreadsheet = false;
        self
    }

    /// Whether paginated documents can be rendered
    pub fn paginated(&self) -> bool {
        self.paginated
    }

    /// Whether workbooks can be built
    pub fn spreadsheet(&self) -> bool {
        self.spreadsheet
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

/// One exporter per format, probed at construction
///
/// Exporters registered with [`ExporterSet::with_exporter`] take the place
/// of the built-in exporter for their format.
pub struct ExporterSet {
    html: HtmlExporter,
    pdf: Option<PdfExporter>,
    excel: Option<SpreadsheetExporter>,
    json: JsonExporter,
    csv: CsvExporter,
    custom: HashMap<ExportFormat, Box<dyn Exporter>>,
}

impl ExporterSet {
    /// Construct every exporter the capabilities allow
    pub fn new(capabilities: Capabilities) -> Self {
        let pdf = PdfExporter::new(capabilities)
            .map_err(|e| tracing::warn!(error = %e, "Paginated export disabled"))
            .ok();
        let excel = SpreadsheetExporter::new(capabilities)
            .map_err(|e| tracing::warn!(error = %e, "Spreadsheet export disabled"))
            .ok();

        let set = Self {
            html: HtmlExporter::new(),
            pdf,
            excel,
            json: JsonExporter::new(),
            csv: CsvExporter::new(),
            custom: HashMap::new(),
        };

        tracing::debug!(
            formats = ?set.supported_formats(),
            "Exporters initialized"
        );
        set
    }

    /// Use `exporter` for the format it reports
    pub fn with_exporter(mut self, exporter: impl Exporter + 'static) -> Self {
        let format = exporter.format();
        tracing::debug!(format = %format, "Custom exporter registered");
        self.custom.insert(format, Box::new(exporter));
        self
    }

    /// Exporter for `format`, if it initialized successfully
    pub fn get(&self, format: ExportFormat) -> Option<&dyn Exporter> {
        if let Some(exporter) = self.custom.get(&format) {
            return Some(exporter.as_ref());
        }
        match format {
            ExportFormat::Html => Some(&self.html),
            ExportFormat::Pdf => self.pdf.as_ref().map(|e| e as &dyn Exporter),
            ExportFormat::Excel => self.excel.as_ref().map(|e| e as &dyn Exporter),
            ExportFormat::Json => Some(&self.json),
            ExportFormat::Csv => Some(&self.csv),
        }
    }

    /// Whether `format` can be produced
    pub fn supports(&self, format: ExportFormat) -> bool {
        self.get(format).is_some()
    }

    /// Formats that can be produced, in canonical order
    pub fn supported_formats(&self) -> Vec<ExportFormat> {
        ExportFormat::ALL
            .into_iter()
            .filter(|format| self.supports(*format))
            .collect()
    }
}

impl Default for ExporterSet {
    fn default() -> Self {
        Self::new(Capabilities::detect())
    }
}
