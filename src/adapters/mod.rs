//! External system integrations for Quire.
//!
//! The export engine consumes report records from the reporting application
//! through the [`ReportProvider`] trait:
//!
//! - [`InMemoryReportProvider`] - reports registered in process
//! - [`JsonFileReportProvider`] - reports read from a JSON file
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate the reporting
//! application and enable testing with in-memory implementations.
//!
//! ```rust
//! use quire::adapters::{InMemoryReportProvider, ReportProvider};
//! use quire::domain::{ReportId, ReportRecord};
//!
//! # async fn example() -> quire::domain::Result<()> {
//! let provider = InMemoryReportProvider::new();
//! provider.insert(ReportRecord::new(ReportId::new(7), "T"));
//!
//! let report = provider.fetch_report(ReportId::new(7)).await?;
//! assert!(report.is_some());
//! # Ok(())
//! # }
//! ```

pub mod reports;

pub use reports::{InMemoryReportProvider, JsonFileReportProvider, ReportProvider};
