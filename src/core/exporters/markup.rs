//! Standalone HTML document exporter

use super::Exporter;
use crate::domain::report::GENERATED_AT_FORMAT;
use crate::domain::{ExportFormat, ExportOptions, ExportPayload, QuireError, Result};
use chrono::Utc;
use minijinja::{context, Environment};
use serde_json::{Map, Value};
use std::path::Path;

/// Title used when neither the options nor the content provide one
pub const DEFAULT_TITLE: &str = "Report";

const DOCUMENT_TEMPLATE_NAME: &str = "document.html";

const DOCUMENT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }}</title>
    <style>
{{ css|safe }}
    </style>
</head>
<body>
    <div class="container">
        <div class="report-content">
{{ content|safe }}
        </div>
        <div class="footer">
            <p>Generated at: {{ generated_at }}</p>
        </div>
    </div>
</body>
</html>
"#;

/// Default stylesheet embedded in every wrapped document
pub const DEFAULT_CSS: &str = r#"        body {
            font-family: 'Helvetica Neue', Arial, sans-serif;
            line-height: 1.6;
            color: #333;
            margin: 0;
            padding: 0;
            background-color: #f5f5f5;
        }

        .container {
            max-width: 1200px;
            margin: 0 auto;
            background-color: white;
            box-shadow: 0 0 10px rgba(0,0,0,0.1);
            min-height: 100vh;
        }

        .report-content {
            padding: 40px;
        }

        h1, h2, h3, h4, h5, h6 {
            color: #2c3e50;
            margin-top: 2em;
            margin-bottom: 1em;
        }

        h1 { font-size: 2.5em; border-bottom: 3px solid #3498db; padding-bottom: 10px; }
        h2 { font-size: 2em; border-bottom: 2px solid #e74c3c; padding-bottom: 8px; }
        h3 { font-size: 1.5em; border-bottom: 1px solid #95a5a6; padding-bottom: 5px; }

        table {
            width: 100%;
            border-collapse: collapse;
            margin: 20px 0;
        }

        th, td {
            border: 1px solid #ddd;
            padding: 12px;
            text-align: left;
        }

        th {
            background-color: #3498db;
            color: white;
            font-weight: bold;
        }

        tr:nth-child(even) {
            background-color: #f9f9f9;
        }

        .badge {
            display: inline-block;
            padding: 0.25em 0.6em;
            font-size: 0.875em;
            font-weight: 700;
            border-radius: 0.375rem;
        }

        .badge-success { background-color: #28a745; color: white; }
        .badge-danger { background-color: #dc3545; color: white; }
        .badge-warning { background-color: #ffc107; color: #212529; }

        .footer {
            background-color: #f8f9fa;
            padding: 20px 40px;
            border-top: 1px solid #dee2e6;
            text-align: center;
            color: #6c757d;
            font-size: 0.9em;
        }"#;

/// Whether `content` is already a complete markup document
pub fn is_complete_document(content: &str) -> bool {
    let head: String = content.trim_start().chars().take(9).collect();
    let head = head.to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

/// Merge caller style overrides after the defaults
///
/// `</` in the caller's CSS is written as the CSS escape `<\/` so the
/// stylesheet cannot close its `<style>` element.
pub fn merge_styles(options: &ExportOptions) -> String {
    match options.css.as_deref().map(str::trim) {
        Some(custom) if !custom.is_empty() => {
            let custom = custom.replace("</", "<\\/");
            format!("{DEFAULT_CSS}\n\n        /* Custom CSS */\n        {custom}")
        }
        _ => DEFAULT_CSS.to_string(),
    }
}

/// Writes UTF-8 HTML documents
///
/// Fragments are wrapped into a full document with the default stylesheet,
/// the caller's `css` appended after it, and a generation-time footer.
/// Content that is already a full document is written unchanged.
#[derive(Debug, Default)]
pub struct HtmlExporter;

impl HtmlExporter {
    /// Create a new HTML exporter
    pub fn new() -> Self {
        Self
    }

    /// Wrap a fragment into a full document
    ///
    /// # Errors
    ///
    /// Returns an error if the document template fails to render.
    pub fn prepare_document(&self, content: &str, options: &ExportOptions) -> Result<String> {
        if is_complete_document(content) {
            return Ok(content.to_string());
        }

        let mut env = Environment::new();
        env.add_template(DOCUMENT_TEMPLATE_NAME, DOCUMENT_TEMPLATE)?;
        let template = env.get_template(DOCUMENT_TEMPLATE_NAME)?;

        let rendered = template.render(context! {
            title => options.title_or(DEFAULT_TITLE),
            css => merge_styles(options),
            content => content,
            generated_at => Utc::now().format(GENERATED_AT_FORMAT).to_string(),
        })?;

        Ok(rendered)
    }
}

impl Exporter for HtmlExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn write(
        &self,
        payload: &ExportPayload,
        destination: &Path,
        options: &ExportOptions,
    ) -> Result<Map<String, Value>> {
        let content = payload.content().ok_or_else(|| {
            QuireError::Export("HTML export requires rendered content".to_string())
        })?;

        let document = self.prepare_document(content, options)?;
        std::fs::write(destination, document.as_bytes())?;

        let mut metadata = Map::new();
        metadata.insert("encoding".to_string(), Value::from("utf-8"));
        metadata.insert(
            "wrapped".to_string(),
            Value::from(!is_complete_document(content)),
        );
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn export(content: &str, options: &ExportOptions) -> (TempDir, String) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.html");
        let result = HtmlExporter::new().produce(
            &ExportPayload::Content(content.to_string()),
            &path,
            options,
        );
        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(result.metadata["encoding"], "utf-8");
        let written = std::fs::read_to_string(&path).unwrap();
        (dir, written)
    }

    #[test]
    fn test_fragment_is_wrapped() {
        let (_dir, html) = export(
            "<h1>Nightly run</h1><p>All suites executed</p>",
            &ExportOptions::new().with_title("HTML export test"),
        );

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>HTML export test</title>"));
        assert!(html.contains("<h1>Nightly run</h1>"));
        assert!(html.contains("All suites executed"));
        assert!(html.contains("Generated at:"));
    }

    #[test]
    fn test_complete_document_is_unchanged() {
        let complete = "<!DOCTYPE html>\n<html>\n<head><title>Full</title></head>\n<body><h1>Full document</h1></body>\n</html>";
        let (_dir, html) = export(complete, &ExportOptions::new());
        assert_eq!(html, complete);
    }

    #[test]
    fn test_custom_css_is_merged_after_defaults() {
        let (_dir, html) = export(
            "<h1>Styled</h1>",
            &ExportOptions::new().with_css("h1 { color: red; }"),
        );

        let default_at = html.find("border-collapse").unwrap();
        let custom_at = html.find("/* Custom CSS */").unwrap();
        assert!(custom_at > default_at);
        assert!(html.contains("h1 { color: red; }"));
    }

    #[test]
    fn test_custom_css_cannot_close_style_block() {
        let (_dir, html) = export(
            "<p>body</p>",
            &ExportOptions::new().with_css("p { margin: 0; }</STYLE><script>alert(1)</script>"),
        );

        assert!(!html.contains("</STYLE>"));
        assert_eq!(html.matches("</style>").count(), 1);
        assert!(html.contains(r"<\/STYLE><script>alert(1)<\/script>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let (_dir, html) = export(
            "<p>body</p>",
            &ExportOptions::new().with_title("<script>alert(1)</script>"),
        );
        assert!(!html.contains("<title><script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_default_title() {
        let (_dir, html) = export("<p>body</p>", &ExportOptions::new());
        assert!(html.contains("<title>Report</title>"));
    }

    #[test]
    fn test_data_payload_is_rejected() {
        let dir = TempDir::new().unwrap();
        let result = HtmlExporter::new().produce(
            &ExportPayload::Data(serde_json::json!({})),
            &dir.path().join("x.html"),
            &ExportOptions::new(),
        );
        assert!(!result.success);
        assert!(result
            .error_message
            .unwrap()
            .contains("requires rendered content"));
    }

    #[test]
    fn test_is_complete_document() {
        assert!(is_complete_document("  <!DOCTYPE html><html></html>"));
        assert!(is_complete_document("<HTML><body></body></HTML>"));
        assert!(!is_complete_document("<h1>fragment</h1>"));
    }
}
