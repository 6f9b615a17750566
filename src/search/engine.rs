//! Match engine: turns a filter expression and a document into ordered match records
//! and the derived filtered view.
//!
//! The engine keeps one [`ScanCache`] keyed on `(text, options)`. Installing a new
//! expression always clears it; a later scan over identical text and options reuses
//! the cached records instead of rescanning.

use crate::expression::{self, ExpressionNode};
use crate::filter::{FilterOptions, FilterSpec, MatchMode, Validation};
use crate::search::coordinator::CancelToken;
use crate::search::matcher::LinePattern;
use std::collections::BTreeSet;
use std::time::Instant;

/// One located occurrence of the active pattern.
///
/// `start` / `end` are character offsets within the line. `order_index` is the
/// discovery order across the whole scan and is the identity used for navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub start: usize,
    pub end: usize,
    pub matched_text: String,
    pub line_number: usize,
    pub order_index: usize,
}

/// Lines containing at least one match, in original order, with their original
/// line numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    pub lines: Vec<String>,
    pub line_mapping: Vec<usize>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Results of the last completed scan. Valid only for the exact `text` and
/// `options` it was computed from.
#[derive(Debug, Clone)]
pub struct ScanCache {
    text: String,
    options: FilterOptions,
    matches: Vec<MatchRecord>,
    line_mapping: Vec<usize>,
}

impl ScanCache {
    fn is_valid_for(&self, text: &str, options: &FilterOptions) -> bool {
        self.options == *options && self.text == text
    }
}

#[derive(Debug, Clone)]
enum ActiveFilter {
    /// Single literal or regex pattern. For a regex that failed to compile this holds
    /// the escaped literal.
    Pattern(String),
    Boolean {
        root: ExpressionNode,
        keywords: Vec<String>,
    },
}

#[derive(Debug, Default)]
pub struct MatchEngine {
    options: FilterOptions,
    /// The spec last installed successfully.
    spec: Option<FilterSpec>,
    active: Option<ActiveFilter>,
    keywords: BTreeSet<String>,
    cache: Option<ScanCache>,
    total_count: usize,
}

impl MatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `expression` as a single pattern. Never fails: a regex that does not
    /// compile is replaced by its escaped literal.
    pub fn set_filter_expression(&mut self, expression: &str, options: FilterOptions) -> Validation {
        self.invalidate_cache();
        self.options = options;
        self.spec = Some(FilterSpec::new(expression, options));

        if expression.is_empty() {
            self.active = None;
            self.keywords.clear();
            return Validation::ok();
        }

        let pattern = if options.use_regex && LinePattern::compile(expression, options).is_err() {
            log::debug!("regex {:?} does not compile, matching it literally", expression);
            regex::escape(expression)
        } else {
            expression.to_string()
        };

        self.keywords = BTreeSet::from([pattern.clone()]);
        self.active = Some(ActiveFilter::Pattern(pattern));
        Validation::ok()
    }

    /// Install a boolean keyword expression. A parse error is reported and leaves
    /// the previous filter, cache and counts untouched.
    pub fn set_boolean_expression(&mut self, expression: &str) -> Validation {
        let root = match expression::parse(expression) {
            Ok(root) => root,
            Err(err) => return Validation::invalid(err.to_string()),
        };

        self.invalidate_cache();
        self.spec = Some(FilterSpec::boolean(expression));
        self.options = FilterOptions {
            case_sensitive: true,
            whole_word: false,
            use_regex: false,
        };

        let mut keywords: Vec<String> = Vec::new();
        for keyword in root.keywords() {
            if !keyword.is_empty() && !keywords.iter().any(|k| k == keyword) {
                keywords.push(keyword.to_string());
            }
        }
        self.keywords = keywords.iter().cloned().collect();
        self.active = Some(ActiveFilter::Boolean { root, keywords });
        Validation::ok()
    }

    /// Install a spec according to its mode.
    pub fn set_filter_spec(&mut self, spec: &FilterSpec) -> Validation {
        match spec.mode {
            MatchMode::Pattern => self.set_filter_expression(&spec.expression, spec.options),
            MatchMode::Boolean => self.set_boolean_expression(&spec.expression),
        }
    }

    /// Install `spec` unless it is already the active one, so that an unchanged
    /// spec keeps its cached scan.
    pub fn apply_spec(&mut self, spec: &FilterSpec) -> Validation {
        if self.spec.as_ref() == Some(spec) {
            return Validation::ok();
        }
        self.set_filter_spec(spec)
    }

    pub fn clear_filter(&mut self) {
        self.invalidate_cache();
        self.spec = None;
        self.active = None;
        self.keywords.clear();
        self.total_count = 0;
    }

    pub fn has_filter(&self) -> bool {
        self.active.is_some()
    }

    pub fn mode(&self) -> Option<MatchMode> {
        self.active.as_ref().map(|active| match active {
            ActiveFilter::Pattern(_) => MatchMode::Pattern,
            ActiveFilter::Boolean { .. } => MatchMode::Boolean,
        })
    }

    pub fn options(&self) -> FilterOptions {
        self.options
    }

    /// Patterns a highlighter should paint.
    pub fn get_keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    /// Number of matches found by the last scan.
    pub fn get_keyword_total_count(&self) -> usize {
        self.total_count
    }

    /// Records from the last scan, without rescanning.
    pub fn cached_matches(&self) -> &[MatchRecord] {
        self.cache.as_ref().map_or(&[][..], |cache| cache.matches.as_slice())
    }

    /// All matches in `text`, ordered by `order_index`.
    pub fn find_keyword_matches(&mut self, text: &str) -> &[MatchRecord] {
        match self.ensure_scanned(text, &CancelToken::new()) {
            Some(cache) => cache.matches.as_slice(),
            None => &[],
        }
    }

    /// Filtered view of `text`. When `expression` is given it is installed first,
    /// in the engine's current mode and with its current options.
    pub fn filter_text(&mut self, text: &str, expression: Option<&str>) -> FilteredView {
        if let Some(expression) = expression {
            match self.mode() {
                Some(MatchMode::Boolean) => {
                    self.set_boolean_expression(expression);
                }
                _ => {
                    self.set_filter_expression(expression, self.options);
                }
            }
        }
        self.filter_text_cancellable(text, &CancelToken::new())
            .unwrap_or_default()
    }

    /// Like [`filter_text`](Self::filter_text) but polls `cancel` after every line.
    /// Returns `None` when cancelled; the cache is left as it was.
    pub fn filter_text_cancellable(
        &mut self,
        text: &str,
        cancel: &CancelToken,
    ) -> Option<FilteredView> {
        if self.active.is_none() {
            return Some(FilteredView::default());
        }
        let cache = self.ensure_scanned(text, cancel)?;

        let lines: Vec<&str> = split_lines(text).map(line_content).collect();
        let filtered = cache
            .line_mapping
            .iter()
            .filter_map(|&line_number| lines.get(line_number).map(|line| line.to_string()))
            .collect();

        Some(FilteredView {
            lines: filtered,
            line_mapping: cache.line_mapping.clone(),
        })
    }

    /// Drop the cached scan and the count that came with it.
    fn invalidate_cache(&mut self) {
        self.cache = None;
        self.total_count = 0;
    }

    fn ensure_scanned(&mut self, text: &str, cancel: &CancelToken) -> Option<&ScanCache> {
        let Some(active) = self.active.as_ref() else {
            self.total_count = 0;
            return None;
        };

        let reuse = self
            .cache
            .as_ref()
            .map_or(false, |cache| cache.is_valid_for(text, &self.options));
        if reuse {
            log::debug!("reusing cached scan ({} matches)", self.total_count);
            return self.cache.as_ref();
        }

        let started = Instant::now();
        let scanned = match active {
            ActiveFilter::Pattern(pattern) => scan_pattern(text, pattern, self.options, cancel),
            ActiveFilter::Boolean { root, keywords } => scan_boolean(text, root, keywords, cancel),
        };
        let (mut matches, line_mapping) = match scanned {
            Some(result) => result,
            None => {
                log::debug!("scan cancelled after {:?}", started.elapsed());
                return None;
            }
        };

        matches.sort_by_key(|record| record.order_index);
        self.total_count = matches.len();
        log::trace!(
            "scanned {} bytes: {} matches on {} lines in {:?}",
            text.len(),
            matches.len(),
            line_mapping.len(),
            started.elapsed()
        );

        self.cache = Some(ScanCache {
            text: text.to_string(),
            options: self.options,
            matches,
            line_mapping,
        });
        self.cache.as_ref()
    }
}

type ScanOutput = (Vec<MatchRecord>, Vec<usize>);

fn scan_pattern(
    text: &str,
    pattern: &str,
    options: FilterOptions,
    cancel: &CancelToken,
) -> Option<ScanOutput> {
    let compiled = match LinePattern::compile(pattern, options) {
        Ok(compiled) => Some(compiled),
        Err(err) => {
            log::debug!("pattern {:?} yields no matches: {}", pattern, err);
            None
        }
    };

    let mut matches = Vec::new();
    let mut line_mapping = Vec::new();
    for (line_number, line) in split_lines(text).enumerate() {
        if let Some(compiled) = &compiled {
            let found = compiled.find_in_line(line_content(line));
            if !found.is_empty() {
                line_mapping.push(line_number);
            }
            push_records(&mut matches, line_number, found);
        }
        if cancel.is_cancelled() {
            return None;
        }
    }
    Some((matches, line_mapping))
}

fn scan_boolean(
    text: &str,
    root: &ExpressionNode,
    keywords: &[String],
    cancel: &CancelToken,
) -> Option<ScanOutput> {
    let exact = FilterOptions {
        case_sensitive: true,
        ..FilterOptions::default()
    };
    let finders: Vec<LinePattern> = keywords
        .iter()
        .filter_map(|keyword| LinePattern::compile(keyword, exact).ok())
        .collect();

    let mut matches = Vec::new();
    let mut line_mapping = Vec::new();
    for (line_number, line) in split_lines(text).enumerate() {
        if root.evaluate(line_content(line)) {
            line_mapping.push(line_number);
            for finder in &finders {
                push_records(&mut matches, line_number, finder.find_in_line(line_content(line)));
            }
        }
        if cancel.is_cancelled() {
            return None;
        }
    }
    Some((matches, line_mapping))
}

fn push_records(
    matches: &mut Vec<MatchRecord>,
    line_number: usize,
    found: Vec<crate::search::matcher::LineMatch>,
) {
    for m in found {
        let order_index = matches.len();
        matches.push(MatchRecord {
            start: m.start,
            end: m.end,
            matched_text: m.text,
            line_number,
            order_index,
        });
    }
}

/// Lines of `text` with their terminators kept.
///
/// Only `\n` ends a line (so `\r\n` does too). A lone `\r`, form feed, vertical tab or
/// Unicode line separator stays inside its line.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive('\n')
}

/// A line without its `\n` or `\r\n` terminator.
pub fn line_content(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
