//! Error types and handling infrastructure for logsift.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! custom error types. The binary layers `anyhow` on top for top-level reporting.
//!
//! ## Design Principles
//!
//! - **User-friendly messages**: Errors should provide actionable feedback
//! - **Local failures**: A failed parse or scan never disturbs earlier results
//! - **Consistency**: Standardized Result type across all modules

use crate::expression::ParseError;
use thiserror::Error;

/// The main error type for logsift operations.
#[derive(Error, Debug)]
pub enum LogsiftError {
    /// File system related errors (file not found, permission denied, etc.)
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed boolean keyword expression
    #[error("Invalid expression: {0}")]
    Parse(#[from] ParseError),

    /// Search setup errors (pattern could not be prepared)
    #[error("Search operation failed: {message}")]
    SearchError { message: String },

    /// A background scan failed unexpectedly
    #[error("Scan failed: {message}")]
    ScanFailed { message: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for logsift operations.
pub type Result<T> = std::result::Result<T, LogsiftError>;

impl LogsiftError {
    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Create a SearchError with a descriptive message
    pub fn search(message: impl Into<String>) -> Self {
        Self::SearchError {
            message: message.into(),
        }
    }

    /// Create a ScanFailed error with a descriptive message
    pub fn scan(message: impl Into<String>) -> Self {
        Self::ScanFailed {
            message: message.into(),
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for LogsiftError {
    fn from(err: std::io::Error) -> Self {
        let message = match err.kind() {
            std::io::ErrorKind::NotFound => "File not found",
            std::io::ErrorKind::PermissionDenied => "Permission denied",
            _ => "IO operation failed",
        };
        Self::FileError {
            message: message.to_string(),
            source: err,
        }
    }
}
