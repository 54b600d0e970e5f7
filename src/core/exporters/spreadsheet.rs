//! Spreadsheet workbook (XLSX) exporter
//!
//! The workbook is planned first as plain data ([`plan_workbook`]) and only
//! then written with `rust_xlsxwriter`. A summary sheet is always present;
//! the test case, defect and coverage sheets appear only when the report
//! data carries the matching list.

use super::{Capabilities, Exporter};
use crate::domain::report::GENERATED_AT_FORMAT;
use crate::domain::{ExportFormat, ExportOptions, ExportPayload, QuireError, Result};
use chrono::Utc;
use serde_json::{Map, Value};
use std::path::Path;

/// Name of the always-present first sheet
pub const SUMMARY_SHEET: &str = "Summary";

const DEFAULT_SUMMARY_TITLE: &str = "Test Report Summary";
const SUMMARY_LABEL_WIDTH: f64 = 20.0;
const SUMMARY_VALUE_WIDTH: f64 = 30.0;
// Summary rows start on the third row, below the merged title
const SUMMARY_FIRST_ROW: u32 = 2;

/// A single worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value
    Empty,
    /// Text value
    Text(String),
    /// Numeric value
    Number(f64),
}

impl Cell {
    /// Convert a JSON value into a cell
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Text(b.to_string()),
            Value::Number(n) => n
                .as_f64()
                .map(Cell::Number)
                .unwrap_or_else(|| Cell::Text(n.to_string())),
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    /// Text as it would appear in the sheet
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }
}

/// How a column's value is taken from a row object
#[derive(Debug, Clone, Copy)]
enum Extract {
    Raw,
    Percent,
    RawOrZero,
}

struct TableLayout {
    name: &'static str,
    source: &'static str,
    columns: &'static [(&'static str, &'static str, Extract)],
    width_cap: usize,
}

const TABLE_LAYOUTS: [TableLayout; 3] = [
    TableLayout {
        name: "Test Cases",
        source: "test_cases",
        columns: &[
            ("ID", "id", Extract::Raw),
            ("Title", "title", Extract::Raw),
            ("Type", "test_type", Extract::Raw),
            ("Status", "status", Extract::Raw),
            ("Priority", "priority", Extract::Raw),
            ("Created At", "created_at", Extract::Raw),
        ],
        width_cap: 50,
    },
    TableLayout {
        name: "Defects",
        source: "defects",
        columns: &[
            ("ID", "id", Extract::Raw),
            ("Type", "defect_type", Extract::Raw),
            ("Severity", "severity", Extract::Raw),
            ("Description", "description", Extract::Raw),
            ("Status", "status", Extract::Raw),
            ("Detected At", "detected_at", Extract::Raw),
        ],
        width_cap: 50,
    },
    TableLayout {
        name: "Coverage",
        source: "coverage_data",
        columns: &[
            ("Module", "function_module", Extract::Raw),
            ("Coverage", "coverage_percentage", Extract::Percent),
            ("Covered Test Cases", "covered_test_cases", Extract::RawOrZero),
            ("Total Test Cases", "total_test_cases", Extract::RawOrZero),
            ("Analysis Date", "analysis_date", Extract::Raw),
        ],
        width_cap: 30,
    },
];

/// Planned content of one worksheet
#[derive(Debug, Clone, PartialEq)]
pub enum SheetPlan {
    /// Title plus label/value rows
    Summary {
        /// Merged title across the first four columns
        title: String,
        /// Label and value pairs
        rows: Vec<(String, Cell)>,
    },
    /// Header row plus one row per item
    Table {
        /// Sheet name
        name: String,
        /// Column headers
        header: Vec<String>,
        /// Data rows
        rows: Vec<Vec<Cell>>,
        /// Column widths in characters
        widths: Vec<f64>,
    },
}

impl SheetPlan {
    /// Sheet name
    pub fn name(&self) -> &str {
        match self {
            SheetPlan::Summary { .. } => SUMMARY_SHEET,
            SheetPlan::Table { name, .. } => name,
        }
    }
}

/// Column widths sized to content: longest value plus two, capped
pub fn column_widths(header: &[String], rows: &[Vec<Cell>], cap: usize) -> Vec<f64> {
    (0..header.len())
        .map(|col| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.display().chars().count())
                .chain(std::iter::once(header[col].chars().count()))
                .max()
                .unwrap_or(0);
            (longest + 2).min(cap) as f64
        })
        .collect()
}

fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

fn summary_sheet(data: &Map<String, Value>, options: &ExportOptions) -> SheetPlan {
    let count = |key: &str| Cell::from_value(data.get(key).unwrap_or(&Value::from(0)));

    let generated_at = data
        .get("report_generated_at")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Utc::now().format(GENERATED_AT_FORMAT).to_string());

    let pass_rate = match data.get("pass_rate").and_then(Value::as_f64) {
        Some(rate) if rate != 0.0 => percent(rate * 100.0),
        _ => "N/A".to_string(),
    };

    SheetPlan::Summary {
        title: options.title_or(DEFAULT_SUMMARY_TITLE).to_string(),
        rows: vec![
            ("Generated At".to_string(), Cell::Text(generated_at)),
            ("Total Test Cases".to_string(), count("total_test_cases")),
            ("Passed".to_string(), count("passed_count")),
            ("Failed".to_string(), count("failed_count")),
            ("Pass Rate".to_string(), Cell::Text(pass_rate)),
        ],
    }
}

fn table_sheet(layout: &TableLayout, items: &[Value]) -> SheetPlan {
    let header: Vec<String> = layout.columns.iter().map(|(h, _, _)| h.to_string()).collect();

    let rows: Vec<Vec<Cell>> = items
        .iter()
        .map(|item| {
            layout
                .columns
                .iter()
                .map(|(_, key, extract)| {
                    let value = item.get(*key);
                    match extract {
                        Extract::Raw => value.map(Cell::from_value).unwrap_or(Cell::Empty),
                        Extract::RawOrZero => {
                            Cell::from_value(value.unwrap_or(&Value::from(0)))
                        }
                        Extract::Percent => Cell::Text(percent(
                            value.and_then(Value::as_f64).unwrap_or(0.0),
                        )),
                    }
                })
                .collect()
        })
        .collect();

    let widths = column_widths(&header, &rows, layout.width_cap);
    SheetPlan::Table {
        name: layout.name.to_string(),
        header,
        rows,
        widths,
    }
}

/// Lay out the workbook for `data`
pub fn plan_workbook(data: &Map<String, Value>, options: &ExportOptions) -> Vec<SheetPlan> {
    let mut sheets = vec![summary_sheet(data, options)];
    for layout in &TABLE_LAYOUTS {
        if let Some(value) = data.get(layout.source) {
            let items = value.as_array().map(Vec::as_slice).unwrap_or(&[]);
            sheets.push(table_sheet(layout, items));
        }
    }
    sheets
}

/// Writes report data as an XLSX workbook
#[derive(Debug)]
pub struct SpreadsheetExporter {
    _private: (),
}

impl SpreadsheetExporter {
    /// Create a spreadsheet exporter
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::CapabilityUnavailable`] if the workbook builder
    /// is absent.
    pub fn new(capabilities: Capabilities) -> Result<Self> {
        if !capabilities.spreadsheet() {
            return Err(QuireError::CapabilityUnavailable {
                format: ExportFormat::Excel,
                reason: "spreadsheet builder is not available (enable the `xlsx` feature)"
                    .to_string(),
            });
        }
        Ok(Self { _private: () })
    }

    #[cfg(feature = "xlsx")]
    fn render(&self, sheets: &[SheetPlan], destination: &Path) -> Result<()> {
        use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};

        let bold = Format::new().set_bold();
        let title_format = Format::new().set_bold().set_font_size(16);
        let header_format = Format::new()
            .set_bold()
            .set_background_color(Color::RGB(0xCCCCCC));

        let mut workbook = Workbook::new();
        for sheet in sheets {
            let mut worksheet = Worksheet::new();
            worksheet.set_name(sheet.name())?;

            match sheet {
                SheetPlan::Summary { title, rows } => {
                    worksheet.merge_range(0, 0, 0, 3, title, &title_format)?;
                    for (row, (label, value)) in (SUMMARY_FIRST_ROW..).zip(rows) {
                        worksheet.write_string_with_format(row, 0, label, &bold)?;
                        write_cell(&mut worksheet, row, 1, value)?;
                    }
                    worksheet.set_column_width(0, SUMMARY_LABEL_WIDTH)?;
                    worksheet.set_column_width(1, SUMMARY_VALUE_WIDTH)?;
                }
                SheetPlan::Table {
                    header,
                    rows,
                    widths,
                    ..
                } => {
                    for (col, text) in (0u16..).zip(header) {
                        worksheet.write_string_with_format(0, col, text, &header_format)?;
                    }
                    for (row, cells) in (1u32..).zip(rows) {
                        for (col, cell) in (0u16..).zip(cells) {
                            write_cell(&mut worksheet, row, col, cell)?;
                        }
                    }
                    for (col, width) in (0u16..).zip(widths) {
                        worksheet.set_column_width(col, *width)?;
                    }
                }
            }

            workbook.push_worksheet(worksheet);
        }

        workbook.save(destination)?;
        Ok(())
    }

    #[cfg(not(feature = "xlsx"))]
    fn render(&self, _sheets: &[SheetPlan], _destination: &Path) -> Result<()> {
        Err(QuireError::CapabilityUnavailable {
            format: ExportFormat::Excel,
            reason: "built without the `xlsx` feature".to_string(),
        })
    }
}

#[cfg(feature = "xlsx")]
fn write_cell(
    worksheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
) -> Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Text(text) => {
            worksheet.write_string(row, col, text)?;
        }
        Cell::Number(number) => {
            worksheet.write_number(row, col, *number)?;
        }
    }
    Ok(())
}

impl Exporter for SpreadsheetExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Excel
    }

    fn write(
        &self,
        payload: &ExportPayload,
        destination: &Path,
        options: &ExportOptions,
    ) -> Result<Map<String, Value>> {
        let data = payload
            .data()
            .and_then(Value::as_object)
            .ok_or_else(|| {
                QuireError::Export("Excel export requires structured report data".to_string())
            })?;

        let sheets = plan_workbook(data, options);
        self.render(&sheets, destination)?;

        let mut metadata = Map::new();
        metadata.insert("sheets".to_string(), Value::from(sheets.len()));
        Ok(metadata)
    }
}
