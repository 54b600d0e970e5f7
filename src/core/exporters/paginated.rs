//! Paginated document (PDF) exporter
//!
//! Markup is flattened into text lines: block-level tags become line breaks,
//! headings are kept as bold lines, everything else is stripped. The lines
//! are then flowed onto A4 pages.

use super::{Capabilities, Exporter};
use crate::domain::{ExportFormat, ExportOptions, ExportPayload, QuireError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::path::Path;

/// Page width in millimetres (A4)
pub const PAGE_WIDTH_MM: f32 = 210.0;
/// Page height in millimetres (A4)
pub const PAGE_HEIGHT_MM: f32 = 297.0;
/// Margin on every side in millimetres
pub const MARGIN_MM: f32 = 20.0;
/// Maximum characters per body line
pub const WRAP_WIDTH: usize = 90;

const BODY_FONT_SIZE: f32 = 11.0;
const BODY_LINE_HEIGHT_MM: f32 = 5.5;
const HEADING_FONT_SIZE: f32 = 14.0;
const HEADING_LINE_HEIGHT_MM: f32 = 8.0;

const HEADING_MARKER: &str = "\u{1}";

/// One line of flattened document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    /// Line text, possibly empty for vertical spacing
    pub text: String,
    /// Whether the line came from a heading element
    pub heading: bool,
}

impl TextLine {
    fn body(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            heading: false,
        }
    }

    fn height_mm(&self) -> f32 {
        if self.heading {
            HEADING_LINE_HEIGHT_MM
        } else {
            BODY_LINE_HEIGHT_MM
        }
    }
}

fn pattern(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|e| QuireError::Render(format!("Invalid markup pattern: {e}")))
}

/// Flattens markup into wrapped text lines
///
/// The tag patterns are compiled once at construction and reused for every
/// document.
#[derive(Debug, Clone)]
pub struct MarkupFlattener {
    invisible: Regex,
    heading: Regex,
    list_item: Regex,
    cell_end: Regex,
    block_end: Regex,
    any_tag: Regex,
}

impl MarkupFlattener {
    /// Compile the tag patterns
    ///
    /// # Errors
    ///
    /// Returns an error only if an internal pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            invisible: pattern(r"(?is)<(head|style|script)[^>]*>.*?</(head|style|script)>")?,
            heading: pattern(r"(?is)<h[1-6][^>]*>(.*?)</h[1-6]>")?,
            list_item: pattern(r"(?i)<li[^>]*>")?,
            cell_end: pattern(r"(?i)</t[dh]>")?,
            block_end: pattern(r"(?i)<br\s*/?>|</(p|div|tr|ul|ol|table|section|thead|tbody)>")?,
            any_tag: pattern(r"(?s)<[^>]+>")?,
        })
    }

    /// Flatten `markup` into lines at most `width` characters wide
    pub fn lines(&self, markup: &str, width: usize) -> Vec<TextLine> {
        let text = self.invisible.replace_all(markup, "");
        let text = self
            .heading
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                format!("\n{HEADING_MARKER}{}\n", caps[1].replace('\n', " "))
            });
        let text = self.list_item.replace_all(&text, "\n- ");
        let text = self.cell_end.replace_all(&text, "  ");
        let text = self.block_end.replace_all(&text, "\n");
        let text = self.any_tag.replace_all(&text, "");
        let text = decode_entities(&text);

        let mut lines: Vec<TextLine> = Vec::new();
        for raw in text.lines() {
            let (is_heading, raw) = match raw.trim().strip_prefix(HEADING_MARKER) {
                Some(rest) => (true, rest),
                None => (false, raw),
            };
            let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

            if collapsed.is_empty() {
                if lines.last().is_some_and(|l| !l.text.is_empty()) {
                    lines.push(TextLine::body(""));
                }
                continue;
            }

            if is_heading {
                if lines.last().is_some_and(|l| !l.text.is_empty()) {
                    lines.push(TextLine::body(""));
                }
                for wrapped in wrap(&collapsed, width) {
                    lines.push(TextLine {
                        text: wrapped,
                        heading: true,
                    });
                }
            } else {
                lines.extend(wrap(&collapsed, width).into_iter().map(TextLine::body));
            }
        }

        while lines.last().is_some_and(|l| l.text.is_empty()) {
            lines.pop();
        }
        lines
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&#x2f;", "/")
        .replace("&amp;", "&")
}

fn wrap(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut current = String::new();

    for word in line.split(' ') {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            out.push(head);
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// A line positioned on a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedLine<'a> {
    /// The line to draw
    pub line: &'a TextLine,
    /// Baseline distance from the bottom edge in millimetres
    pub y_mm: f32,
}

/// Flow lines onto pages, top to bottom
///
/// Always returns at least one (possibly empty) page. Blank lines take up
/// space but are not placed.
pub fn layout_pages(lines: &[TextLine]) -> Vec<Vec<PlacedLine<'_>>> {
    let top = PAGE_HEIGHT_MM - MARGIN_MM;
    let mut pages = vec![Vec::new()];
    let mut cursor = top;

    for line in lines {
        let height = line.height_mm();
        if cursor - height < MARGIN_MM {
            pages.push(Vec::new());
            cursor = top;
        }
        cursor -= height;

        if !line.text.is_empty() {
            if let Some(page) = pages.last_mut() {
                page.push(PlacedLine {
                    line,
                    y_mm: cursor,
                });
            }
        }
    }
    pages
}

/// Renders markup into an A4 PDF
///
/// Construction fails with [`QuireError::CapabilityUnavailable`] when the
/// paginated renderer is not available in this build.
#[derive(Debug)]
pub struct PdfExporter {
    flattener: MarkupFlattener,
    wrap_width: usize,
}

impl PdfExporter {
    /// Create a PDF exporter
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::CapabilityUnavailable`] if the renderer is absent.
    pub fn new(capabilities: Capabilities) -> Result<Self> {
        if !capabilities.paginated() {
            return Err(QuireError::CapabilityUnavailable {
                format: ExportFormat::Pdf,
                reason: "paginated document renderer is not available (enable the `pdf` feature)"
                    .to_string(),
            });
        }
        Ok(Self {
            flattener: MarkupFlattener::new()?,
            wrap_width: WRAP_WIDTH,
        })
    }

    #[cfg(feature = "pdf")]
    fn render(&self, title: &str, lines: &[TextLine], destination: &Path) -> Result<usize> {
        use printpdf::{BuiltinFont, Mm, PdfDocument};
        use std::fs::File;
        use std::io::BufWriter;

        let pages = layout_pages(lines);
        let (doc, first_page, first_layer) = PdfDocument::new(
            title,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Page 1",
        );
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

        for (index, page) in pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_index, layer_index) = doc.add_page(
                    Mm(PAGE_WIDTH_MM),
                    Mm(PAGE_HEIGHT_MM),
                    format!("Page {}", index + 1),
                );
                doc.get_page(page_index).get_layer(layer_index)
            };

            for placed in page {
                let (font, size) = if placed.line.heading {
                    (&bold, HEADING_FONT_SIZE)
                } else {
                    (&regular, BODY_FONT_SIZE)
                };
                layer.use_text(
                    placed.line.text.clone(),
                    size,
                    Mm(MARGIN_MM),
                    Mm(placed.y_mm),
                    font,
                );
            }
        }

        let file = File::create(destination)?;
        doc.save(&mut BufWriter::new(file))?;
        Ok(pages.len())
    }

    #[cfg(not(feature = "pdf"))]
    fn render(&self, _title: &str, _lines: &[TextLine], _destination: &Path) -> Result<usize> {
        Err(QuireError::CapabilityUnavailable {
            format: ExportFormat::Pdf,
            reason: "built without the `pdf` feature".to_string(),
        })
    }
}

impl Exporter for PdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn write(
        &self,
        payload: &ExportPayload,
        destination: &Path,
        options: &ExportOptions,
    ) -> Result<Map<String, Value>> {
        let content = payload.content().ok_or_else(|| {
            QuireError::Export("PDF export requires rendered content".to_string())
        })?;

        let lines = self.flattener.lines(content, self.wrap_width);
        let title = options.title_or(super::markup::DEFAULT_TITLE);
        let pages = self.render(title, &lines, destination)?;

        let mut metadata = Map::new();
        metadata.insert("pages".to_string(), Value::from(pages));
        metadata.insert("lines".to_string(), Value::from(lines.len()));
        Ok(metadata)
    }
}
