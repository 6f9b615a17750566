//! # logsift - Log Filtering and Match Navigation
//!
//! The search core of a log viewer: it filters a loaded document down to the lines
//! matching a search expression, records every match with its character position,
//! and lets the caller step through matches in document order.
//!
//! ## Features
//!
//! - **Pattern filters**: plain (overlapping), whole-word or regex matching, with an
//!   optional case-sensitive mode
//! - **Boolean keyword expressions**: `"timeout" and ("db" or "cache")`
//! - **Background scans**: cancellable scans on the tokio blocking pool, with
//!   exactly-once delivery of each scan's outcome
//! - **Navigation**: wraparound next/previous and seeding from a clicked position
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`expression`] - Boolean keyword expression lexer, parser and AST
//! - [`filter`] - Matching options and filter requests
//! - [`search`] - Match engine, navigation, highlighting and scan coordination
//! - [`marks`] - Bookmarked lines
//! - [`config`] - Viewer configuration

pub mod config;
pub mod error;
pub mod expression;
pub mod filter;
pub mod marks;
pub mod search;

// Re-export commonly used types for convenience
pub use config::ViewerConfig;
pub use error::{LogsiftError, Result};
pub use expression::{ExpressionNode, ParseError};
pub use filter::{FilterOptions, FilterSpec, MatchMode, Validation};
pub use marks::{Mark, MarkSet};
pub use search::{
    Highlighter, MatchEngine, MatchIndex, MatchRecord, ScanCoordinator, ScanReport, ScanState,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
