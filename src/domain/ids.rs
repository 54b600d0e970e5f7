//! Domain identifier types
//!
//! Newtype wrappers keep task identifiers and report references from being
//! mixed up with each other or with plain strings and integers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Export task identifier
///
/// An opaque, randomly generated token. Callers receive it from a submission
/// and hand it back to query status.
///
/// # Examples
///
/// ```
/// use quire::domain::ids::TaskId;
/// use std::str::FromStr;
///
/// let id = TaskId::generate();
/// let parsed = TaskId::from_str(&id.to_string()).unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generates a fresh random task ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid task ID '{s}': {e}"))
    }
}

/// Reference to a report owned by the reporting application
///
/// # Examples
///
/// ```
/// use quire::domain::ids::ReportId;
/// use std::str::FromStr;
///
/// let id = ReportId::from_str("7").unwrap();
/// assert_eq!(id.value(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(u64);

impl ReportId {
    /// Creates a new ReportId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReportId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| format!("Invalid report ID '{s}': expected a non-negative integer"))
    }
}

impl From<u64> for ReportId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_ids_are_unique() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_task_id_parse_invalid() {
        assert!(TaskId::from_str("not-a-uuid").is_err());
        assert!(TaskId::from_str("").is_err());
    }

    #[test]
    fn test_task_id_serializes_as_string() {
        let id = TaskId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn test_report_id_parse() {
        assert_eq!(ReportId::from_str(" 42 ").unwrap(), ReportId::new(42));
        assert!(ReportId::from_str("-1").is_err());
        assert!(ReportId::from_str("abc").is_err());
    }

    #[test]
    fn test_report_id_serializes_as_number() {
        let json = serde_json::to_string(&ReportId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
