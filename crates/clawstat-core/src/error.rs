//! Error types for clawstat
//!
//! This module defines the error types used throughout the clawstat crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! Data-shape problems inside log files and the schedule config never reach
//! callers as errors; they are folded into empty results by the parser and
//! reader. What remains here is what a caller can act on.
//!
//! # Example
//!
//! ```
//! use clawstat_core::error::{ClawstatError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to ClawstatError
//!     let _file = std::fs::read_to_string("nonexistent.txt")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for clawstat operations
#[derive(Error, Debug)]
pub enum ClawstatError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error with file context
    #[error("Parse error in {file}: {error}")]
    Parse {
        /// The file that caused the error
        file: PathBuf,
        /// The error message
        error: String,
    },

    /// Invalid timezone
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClawstatError {
    /// Wrap an IO error with the path it happened on
    pub fn io_at(path: &std::path::Path, error: std::io::Error) -> Self {
        ClawstatError::Io(std::io::Error::new(
            error.kind(),
            format!("{}: {}", path.display(), error),
        ))
    }
}

/// Convenience type alias for Results in clawstat
///
/// ```
/// use clawstat_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, ClawstatError>;
