//! Export orchestration
//!
//! - [`manager`] - submission, status queries, cleanup and shutdown
//! - [`render`] - markup content rendering for document formats

pub mod manager;
pub mod render;

pub use manager::{ExportManager, ExportManagerBuilder};
pub use render::{BuiltinRenderer, ContentRenderer};
