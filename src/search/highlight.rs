//! Highlight spans for display.
//!
//! Spans are `(start, end)` character offsets, sorted by start. Spans from different
//! keywords may overlap; merging them is left to the renderer.

use crate::filter::FilterOptions;
use crate::search::engine::MatchEngine;
use crate::search::matcher::LinePattern;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    patterns: Vec<LinePattern>,
}

impl Highlighter {
    /// Compile one pattern per keyword. Keywords that fail to compile are skipped.
    pub fn new<'a>(keywords: impl IntoIterator<Item = &'a str>, options: FilterOptions) -> Self {
        let patterns = keywords
            .into_iter()
            .filter(|keyword| !keyword.is_empty())
            .filter_map(|keyword| match LinePattern::compile(keyword, options) {
                Ok(pattern) => Some(pattern),
                Err(err) => {
                    log::debug!("skipping highlight for {:?}: {}", keyword, err);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Highlight whatever filter is installed in `engine`.
    pub fn from_engine(engine: &MatchEngine) -> Self {
        Self::from_keywords(engine.get_keywords(), engine.options())
    }

    pub fn from_keywords(keywords: &BTreeSet<String>, options: FilterOptions) -> Self {
        Self::new(keywords.iter().map(String::as_str), options)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn line_spans(&self, line: &str) -> Vec<(usize, usize)> {
        let mut spans: Vec<(usize, usize)> = self
            .patterns
            .iter()
            .flat_map(|pattern| pattern.find_in_line(line))
            .map(|m| (m.start, m.end))
            .collect();
        spans.sort_unstable();
        spans.dedup();
        spans
    }

    pub fn spans_for_lines<'a>(
        &self,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Vec<Vec<(usize, usize)>> {
        lines.into_iter().map(|line| self.line_spans(line)).collect()
    }
}
