//! Report content rendering
//!
//! Markup-based formats are rendered at submission time. Callers can plug in
//! their own [`ContentRenderer`]; [`BuiltinRenderer`] is used otherwise.

use crate::domain::{ExportOptions, ReportRecord, Result};
use minijinja::{context, Environment};
use serde::Serialize;
use serde_json::Value;

/// Produces a markup fragment for a report
pub trait ContentRenderer: Send + Sync {
    /// Render `report` with the caller's options
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be rendered.
    fn render(&self, report: &ReportRecord, options: &ExportOptions) -> Result<String>;
}

const REPORT_TEMPLATE_NAME: &str = "report.html";
const CUSTOM_TEMPLATE_NAME: &str = "custom.html";

const REPORT_TEMPLATE: &str = r#"<h1>{{ title }}</h1>

<h2>Overview</h2>
<ul>
    <li><strong>Report type:</strong> {{ report_type }}</li>
    <li><strong>Generated at:</strong> {{ generated_at }}</li>
</ul>
{% if metrics %}
<h2>Summary</h2>
<table>
    <thead><tr><th>Metric</th><th>Value</th></tr></thead>
    <tbody>
{%- for metric in metrics %}
        <tr><td>{{ metric.label }}</td><td>{{ metric.value }}</td></tr>
{%- endfor %}
    </tbody>
</table>
{% endif %}"#;

#[derive(Debug, Serialize, PartialEq)]
struct Metric {
    label: String,
    value: String,
}

fn metric_label(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// Scalars are shown as-is, collections by their size
fn metrics(report: &ReportRecord) -> Vec<Metric> {
    report
        .report_data
        .iter()
        .filter(|(key, _)| key.as_str() != "title")
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Array(items) => format!("{} items", items.len()),
                Value::Object(fields) => format!("{} fields", fields.len()),
                other => other.to_string(),
            };
            Some(Metric {
                label: metric_label(key),
                value,
            })
        })
        .collect()
}

/// Minimal HTML fragment renderer
///
/// Shows the title, report type, generation time and a table of the
/// report's top-level metrics. `options.template` replaces the built-in
/// template; it sees `title`, `report_type`, `generated_at`, `metrics`,
/// `data` and `options`. Values are HTML-escaped.
#[derive(Debug, Default)]
pub struct BuiltinRenderer;

impl BuiltinRenderer {
    /// Create the built-in renderer
    pub fn new() -> Self {
        Self
    }
}

impl ContentRenderer for BuiltinRenderer {
    fn render(&self, report: &ReportRecord, options: &ExportOptions) -> Result<String> {
        let mut env = Environment::new();
        let name = match options.template.as_deref() {
            Some(source) if !source.trim().is_empty() => {
                env.add_template(CUSTOM_TEMPLATE_NAME, source)?;
                CUSTOM_TEMPLATE_NAME
            }
            _ => {
                env.add_template(REPORT_TEMPLATE_NAME, REPORT_TEMPLATE)?;
                REPORT_TEMPLATE_NAME
            }
        };

        let template = env.get_template(name)?;
        let rendered = template.render(context! {
            title => options.title_or(&report.title),
            report_type => &report.report_type,
            generated_at => report.generated_at_display().unwrap_or_else(|| "N/A".to_string()),
            metrics => metrics(report),
            data => &report.report_data,
            options => options,
        })?;

        Ok(rendered)
    }
}
