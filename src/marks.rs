//! Bookmarked lines.
//!
//! A [`MarkSet`] belongs to one document and holds at most one mark per original
//! line number, iterated in line order.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub line_number: usize,
    /// Line text at the time it was marked, without its terminator.
    pub content: String,
    pub note: String,
}

#[derive(Debug, Clone, Default)]
pub struct MarkSet {
    marks: BTreeMap<usize, Mark>,
}

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `line_number`. Returns `false` if the line is already marked.
    pub fn add(&mut self, line_number: usize, content: impl Into<String>, note: impl Into<String>) -> bool {
        if self.marks.contains_key(&line_number) {
            return false;
        }
        self.marks.insert(
            line_number,
            Mark {
                line_number,
                content: content.into(),
                note: note.into(),
            },
        );
        true
    }

    pub fn remove(&mut self, line_number: usize) -> bool {
        self.marks.remove(&line_number).is_some()
    }

    pub fn is_marked(&self, line_number: usize) -> bool {
        self.marks.contains_key(&line_number)
    }

    pub fn get(&self, line_number: usize) -> Option<&Mark> {
        self.marks.get(&line_number)
    }

    pub fn note(&self, line_number: usize) -> Option<&str> {
        self.marks.get(&line_number).map(|mark| mark.note.as_str())
    }

    /// Replace the note of an existing mark. Returns `false` if the line is not marked.
    pub fn set_note(&mut self, line_number: usize, note: impl Into<String>) -> bool {
        match self.marks.get_mut(&line_number) {
            Some(mark) => {
                mark.note = note.into();
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.marks.values()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    /// Marks shown in a filtered view, paired with their filtered line index.
    ///
    /// `line_mapping` is the view's filtered-to-original mapping and must be ascending.
    pub fn retain_lines<'a>(&'a self, line_mapping: &'a [usize]) -> impl Iterator<Item = (usize, &'a Mark)> + 'a {
        self.marks.values().filter_map(move |mark| {
            line_mapping
                .binary_search(&mark.line_number)
                .ok()
                .map(|filtered| (filtered, mark))
        })
    }
}
