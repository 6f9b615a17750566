//! Per-line pattern matching.
//!
//! A [`LinePattern`] is compiled once per scan from the active pattern and the
//! [`FilterOptions`], then applied to each line. All offsets it reports are character
//! offsets within the line. A trailing `\n` or `\r\n` is never searched, so anchors
//! see only the line's content.
//!
//! - plain: overlapping literal search (`"aa"` in `"aaa"` matches at 0 and 1)
//! - whole word: `\b<escaped pattern>\b`
//! - regex: the pattern itself, case-insensitive unless requested otherwise
//!
//! Plain and whole-word modes fold case by lower-casing both sides. Folding keeps the
//! character count of the line unchanged so offsets map back onto the original text.

use crate::error::{LogsiftError, Result};
use crate::filter::FilterOptions;
use crate::search::engine::line_content;
use grep_matcher::{Match, Matcher, NoCaptures, NoError};
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use memchr::memmem::Finder;

/// One occurrence of the pattern inside a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// A `grep_matcher::Matcher` backed by `memchr::memmem` for literal search.
#[derive(Debug, Clone)]
pub struct LiteralMatcher {
    finder: Finder<'static>,
}

impl LiteralMatcher {
    pub fn new(needle: &str) -> Self {
        Self {
            finder: Finder::new(needle.as_bytes()).into_owned(),
        }
    }

    fn needle_len(&self) -> usize {
        self.finder.needle().len()
    }
}

impl Matcher for LiteralMatcher {
    type Captures = NoCaptures;
    type Error = NoError;

    #[inline]
    fn find_at(&self, haystack: &[u8], at: usize) -> std::result::Result<Option<Match>, NoError> {
        let found = haystack
            .get(at..)
            .and_then(|hay| self.finder.find(hay))
            .map(|pos| Match::new(at + pos, at + pos + self.needle_len()));
        Ok(found)
    }

    #[inline]
    fn new_captures(&self) -> std::result::Result<NoCaptures, NoError> {
        Ok(NoCaptures::new())
    }
}

#[derive(Debug, Clone)]
enum Strategy {
    Literal(LiteralMatcher),
    WholeWord(RegexMatcher),
    Regex(RegexMatcher),
}

/// The active pattern, compiled for one set of options.
#[derive(Debug, Clone)]
pub struct LinePattern {
    strategy: Strategy,
    fold_case: bool,
}

impl LinePattern {
    /// Compile `pattern` for `options`.
    ///
    /// Fails for an empty pattern and, in regex mode, for a pattern that is not a
    /// valid regular expression.
    pub fn compile(pattern: &str, options: FilterOptions) -> Result<Self> {
        if pattern.is_empty() {
            return Err(LogsiftError::search("pattern is empty"));
        }

        if options.use_regex {
            let matcher = RegexMatcherBuilder::new()
                .case_insensitive(!options.case_sensitive)
                .build(pattern)
                .map_err(|err| LogsiftError::search(format!("invalid regex: {}", err)))?;
            return Ok(Self {
                strategy: Strategy::Regex(matcher),
                fold_case: false,
            });
        }

        let fold_case = !options.case_sensitive;
        let needle = if fold_case {
            fold_case_preserving_len(pattern)
        } else {
            pattern.to_string()
        };

        let strategy = if options.whole_word {
            let word = format!(r"\b{}\b", regex::escape(&needle));
            let matcher = RegexMatcherBuilder::new()
                .build(&word)
                .map_err(|err| LogsiftError::search(format!("invalid pattern: {}", err)))?;
            Strategy::WholeWord(matcher)
        } else {
            Strategy::Literal(LiteralMatcher::new(&needle))
        };

        Ok(Self {
            strategy,
            fold_case,
        })
    }

    /// Every match in `line`, left to right. The line terminator, if any, is ignored.
    pub fn find_in_line(&self, line: &str) -> Vec<LineMatch> {
        let line = line_content(line);
        let folded;
        let haystack = if self.fold_case {
            folded = fold_case_preserving_len(line);
            folded.as_str()
        } else {
            line
        };

        let spans = self.byte_spans(haystack.as_bytes());
        if spans.is_empty() {
            return Vec::new();
        }

        let hay_columns = CharColumns::new(haystack);
        let line_columns = if self.fold_case {
            CharColumns::new(line)
        } else {
            hay_columns.clone()
        };

        spans
            .into_iter()
            .map(|(start_byte, end_byte)| {
                let start = hay_columns.to_char(start_byte);
                let end = hay_columns.to_char(end_byte);
                let text = line[line_columns.to_byte(start)..line_columns.to_byte(end)].to_string();
                LineMatch { start, end, text }
            })
            .collect()
    }

    /// Whether `line` contains at least one match.
    pub fn is_match(&self, line: &str) -> bool {
        !self.find_in_line(line).is_empty()
    }

    fn byte_spans(&self, haystack: &[u8]) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        match &self.strategy {
            Strategy::Literal(matcher) => {
                // Restart one byte past each match start so overlapping hits are kept.
                let mut at = 0;
                while let Ok(Some(m)) = matcher.find_at(haystack, at) {
                    spans.push((m.start(), m.end()));
                    at = m.start() + 1;
                }
            }
            Strategy::WholeWord(matcher) | Strategy::Regex(matcher) => {
                let result = matcher.find_iter(haystack, |m| {
                    spans.push((m.start(), m.end()));
                    true
                });
                if let Err(err) = result {
                    log::debug!("regex iteration stopped early: {}", err);
                }
            }
        }
        spans
    }
}

/// Lower-case `text` one character at a time, keeping characters whose lower-case
/// form is more than one character unchanged.
pub fn fold_case_preserving_len(text: &str) -> String {
    if text.is_ascii() {
        return text.to_ascii_lowercase();
    }
    text.chars()
        .map(|ch| {
            let mut lower = ch.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(single), None) => single,
                _ => ch,
            }
        })
        .collect()
}

/// Byte <-> character offset conversion for one line.
#[derive(Debug, Clone)]
struct CharColumns {
    /// Byte offset of every char boundary including the end; `None` for ASCII.
    boundaries: Option<Vec<usize>>,
}

impl CharColumns {
    fn new(text: &str) -> Self {
        if text.is_ascii() {
            return Self { boundaries: None };
        }
        let mut boundaries: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
        boundaries.push(text.len());
        Self {
            boundaries: Some(boundaries),
        }
    }

    fn to_char(&self, byte: usize) -> usize {
        match &self.boundaries {
            None => byte,
            Some(boundaries) => boundaries.partition_point(|&b| b < byte),
        }
    }

    fn to_byte(&self, column: usize) -> usize {
        match &self.boundaries {
            None => column,
            Some(boundaries) => boundaries[column.min(boundaries.len() - 1)],
        }
    }
}
