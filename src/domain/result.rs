//! Result type alias for Quire

use super::errors::QuireError;

/// Result type alias for Quire operations
///
/// # Examples
///
/// ```
/// use quire::domain::result::Result;
/// use quire::domain::errors::QuireError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(QuireError::Export("disk full".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, QuireError>;
