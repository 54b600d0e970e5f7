//! Export output formats

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format of an export
///
/// The string form (`html`, `pdf`, `excel`, `json`, `csv`) is what callers
/// submit and what [`ExportFormat::as_str`] reports; the file extension may
/// differ (`excel` files are written as `.xlsx`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Standalone markup document
    Html,
    /// Paginated document
    Pdf,
    /// Spreadsheet workbook
    Excel,
    /// Raw structured data
    Json,
    /// Comma-separated rows
    Csv,
}

impl ExportFormat {
    /// Every format in the order they are reported to callers
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Html,
        ExportFormat::Pdf,
        ExportFormat::Excel,
        ExportFormat::Json,
        ExportFormat::Csv,
    ];

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "excel",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// File extension used for output files
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            other => other.as_str(),
        }
    }

    /// Whether the exporter consumes rendered markup rather than raw data
    pub fn uses_rendered_content(&self) -> bool {
        matches!(self, ExportFormat::Html | ExportFormat::Pdf)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" | "markup" => Ok(ExportFormat::Html),
            "pdf" => Ok(ExportFormat::Pdf),
            "excel" | "xlsx" | "spreadsheet" => Ok(ExportFormat::Excel),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!(
                "Invalid export format '{other}'. Must be one of: html, pdf, excel, json, csv"
            )),
        }
    }
}
