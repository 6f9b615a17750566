//! Match navigation.
//!
//! [`MatchIndex`] owns the match list of one scan together with the filtered view's
//! line mapping, and keeps a cursor that wraps around in both directions.

use crate::search::coordinator::ScanReport;
use crate::search::engine::MatchRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub current_order_index: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MatchIndex {
    /// Sorted by `order_index`; line numbers are non-decreasing along it.
    matches: Vec<MatchRecord>,
    /// Original line number of each filtered-view line, ascending.
    line_mapping: Vec<usize>,
    position: usize,
}

impl MatchIndex {
    pub fn new(mut matches: Vec<MatchRecord>, line_mapping: Vec<usize>) -> Self {
        matches.sort_by_key(|record| record.order_index);
        Self {
            matches,
            line_mapping,
            position: 0,
        }
    }

    pub fn from_report(report: &ScanReport) -> Self {
        Self::new(report.matches.clone(), report.line_mapping.clone())
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn cursor(&self) -> Cursor {
        Cursor {
            current_order_index: self.current().map_or(0, |m| m.order_index),
            total: self.matches.len(),
        }
    }

    /// `(current, total)` for a status label, 1-based; `(0, 0)` without matches.
    pub fn status(&self) -> (usize, usize) {
        if self.matches.is_empty() {
            (0, 0)
        } else {
            (self.position + 1, self.matches.len())
        }
    }

    pub fn current(&self) -> Option<&MatchRecord> {
        self.matches.get(self.position)
    }

    pub fn get(&self, order_index: usize) -> Option<&MatchRecord> {
        self.locate(order_index).map(|pos| &self.matches[pos])
    }

    /// Move the cursor onto the match with `order_index`.
    pub fn select(&mut self, order_index: usize) -> Option<&MatchRecord> {
        let pos = self.locate(order_index)?;
        self.position = pos;
        self.current()
    }

    pub fn next_match(&mut self) -> Option<&MatchRecord> {
        if self.matches.is_empty() {
            return None;
        }
        self.position = (self.position + 1) % self.matches.len();
        self.current()
    }

    pub fn previous_match(&mut self) -> Option<&MatchRecord> {
        if self.matches.is_empty() {
            return None;
        }
        self.position = self
            .position
            .checked_sub(1)
            .unwrap_or(self.matches.len() - 1);
        self.current()
    }

    /// Seed navigation from a document coordinate: the match on `line_number` whose
    /// span contains `char_offset`, else the first match on that line, else the first
    /// match overall.
    pub fn jump_to_position(&mut self, line_number: usize, char_offset: usize) -> Option<&MatchRecord> {
        if self.matches.is_empty() {
            return None;
        }
        let range = self.line_range(line_number);
        let on_line = &self.matches[range.clone()];
        self.position = on_line
            .iter()
            .position(|m| m.start <= char_offset && char_offset <= m.end)
            .or(if on_line.is_empty() { None } else { Some(0) })
            .map_or(0, |offset| range.start + offset);
        self.current()
    }

    /// Seed navigation from a selected span, preferring a match with exactly that span.
    pub fn jump_to_selection(
        &mut self,
        line_number: usize,
        start: usize,
        end: usize,
    ) -> Option<&MatchRecord> {
        let range = self.line_range(line_number);
        if let Some(offset) = self.matches[range.clone()]
            .iter()
            .position(|m| m.start == start && m.end == end)
        {
            self.position = range.start + offset;
            return self.current();
        }
        self.jump_to_position(line_number, start)
    }

    /// Pick a match from a click in the filtered view: the match containing
    /// `char_offset`, else the one starting nearest to it. Leaves the cursor alone
    /// when the filtered line has no matches.
    pub fn jump_to_filtered_position(
        &mut self,
        filtered_line: usize,
        char_offset: usize,
    ) -> Option<&MatchRecord> {
        let line_number = self.original_line(filtered_line)?;
        let range = self.line_range(line_number);
        let on_line = &self.matches[range.clone()];

        let offset = on_line
            .iter()
            .position(|m| m.start <= char_offset && char_offset <= m.end)
            .or_else(|| {
                on_line
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, m)| m.start.abs_diff(char_offset))
                    .map(|(idx, _)| idx)
            })?;
        self.position = range.start + offset;
        self.current()
    }

    pub fn matches_on_line(&self, line_number: usize) -> &[MatchRecord] {
        &self.matches[self.line_range(line_number)]
    }

    pub fn line_mapping(&self) -> &[usize] {
        &self.line_mapping
    }

    /// Original line number shown at `filtered_line` of the filtered view.
    pub fn original_line(&self, filtered_line: usize) -> Option<usize> {
        self.line_mapping.get(filtered_line).copied()
    }

    /// Position of `original_line` in the filtered view, if it is shown there.
    pub fn filtered_line(&self, original_line: usize) -> Option<usize> {
        self.line_mapping.binary_search(&original_line).ok()
    }

    fn locate(&self, order_index: usize) -> Option<usize> {
        // Order indices from a full scan are dense, so try the direct slot first.
        match self.matches.get(order_index) {
            Some(m) if m.order_index == order_index => Some(order_index),
            _ => self
                .matches
                .binary_search_by_key(&order_index, |m| m.order_index)
                .ok(),
        }
    }

    fn line_range(&self, line_number: usize) -> std::ops::Range<usize> {
        let start = self.matches.partition_point(|m| m.line_number < line_number);
        let end = self.matches.partition_point(|m| m.line_number <= line_number);
        start..end
    }
}
