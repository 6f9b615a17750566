//! Filtering, match navigation and background scans.

pub mod coordinator;
pub mod engine;
pub mod highlight;
pub mod matcher;
pub mod navigator;

pub use coordinator::{CancelToken, ScanCoordinator, ScanId, ScanReport, ScanState};
pub use engine::{FilteredView, MatchEngine, MatchRecord};
pub use highlight::Highlighter;
pub use matcher::{LineMatch, LinePattern};
pub use navigator::{Cursor, MatchIndex};
