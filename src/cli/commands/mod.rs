//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod cleanup;
pub mod export;
pub mod formats;
pub mod init;
pub mod validate;
