//! Report records supplied by the reporting application

use super::ids::ReportId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Display format for generation timestamps inside exported documents
pub const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A generated report as returned by a [`crate::adapters::ReportProvider`]
///
/// # Examples
///
/// ```
/// use quire::domain::{ReportId, ReportRecord};
/// use serde_json::json;
///
/// let report = ReportRecord::new(ReportId::new(7), "Nightly regression")
///     .with_report_type("test_summary")
///     .with_data(json!({"total_test_cases": 3}));
///
/// assert_eq!(report.export_data()["total_test_cases"], 3);
/// assert_eq!(report.export_data()["title"], "Nightly regression");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Report identifier
    pub id: ReportId,

    /// Human-readable title
    pub title: String,

    /// Report category (e.g. "test_summary", "coverage")
    #[serde(default = "default_report_type")]
    pub report_type: String,

    /// When the reporting application generated the report
    #[serde(default)]
    pub generation_time: Option<DateTime<Utc>>,

    /// Structured report body
    #[serde(default)]
    pub report_data: Map<String, Value>,
}

impl ReportRecord {
    /// Creates a report with an empty body
    pub fn new(id: ReportId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            report_type: default_report_type(),
            generation_time: None,
            report_data: Map::new(),
        }
    }

    /// Sets the report type
    pub fn with_report_type(mut self, report_type: impl Into<String>) -> Self {
        self.report_type = report_type.into();
        self
    }

    /// Sets the generation time
    pub fn with_generation_time(mut self, generation_time: DateTime<Utc>) -> Self {
        self.generation_time = Some(generation_time);
        self
    }

    /// Sets the report body
    ///
    /// Non-object values are stored under a `value` key.
    pub fn with_data(mut self, data: Value) -> Self {
        self.report_data = match data {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self
    }

    /// Formatted generation time, if known
    pub fn generated_at_display(&self) -> Option<String> {
        self.generation_time
            .map(|t| t.format(GENERATED_AT_FORMAT).to_string())
    }

    /// Flattened view used by the data-oriented exporters
    ///
    /// The report body is merged with the record's own fields; record fields
    /// take precedence on key collisions.
    pub fn export_data(&self) -> Value {
        let mut data = self.report_data.clone();
        data.insert("id".to_string(), Value::from(self.id.value()));
        data.insert("title".to_string(), Value::from(self.title.clone()));
        data.insert(
            "report_type".to_string(),
            Value::from(self.report_type.clone()),
        );
        if let Some(generated_at) = self.generated_at_display() {
            data.insert(
                "report_generated_at".to_string(),
                Value::from(generated_at),
            );
        }
        Value::Object(data)
    }
}

fn default_report_type() -> String {
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_export_data_merges_fields() {
        let generated = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let report = ReportRecord::new(ReportId::new(3), "Weekly")
            .with_generation_time(generated)
            .with_data(json!({"passed_count": 8, "title": "ignored"}));

        let data = report.export_data();
        assert_eq!(data["id"], 3);
        assert_eq!(data["title"], "Weekly");
        assert_eq!(data["passed_count"], 8);
        assert_eq!(data["report_type"], "unknown");
        assert_eq!(data["report_generated_at"], "2024-01-15 10:30:00");
    }

    #[test]
    fn test_with_data_wraps_scalars() {
        let report = ReportRecord::new(ReportId::new(1), "Scalar").with_data(json!(5));
        assert_eq!(report.report_data.get("value"), Some(&json!(5)));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let report: ReportRecord = serde_json::from_value(json!({"id": 9, "title": "Min"})).unwrap();
        assert_eq!(report.id, ReportId::new(9));
        assert_eq!(report.report_type, "unknown");
        assert!(report.generation_time.is_none());
        assert!(report.report_data.is_empty());
    }
}
