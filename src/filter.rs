//! Filter request values: matching options, the immutable filter spec, and
//! validation results handed back to the caller.

/// Matching options chosen in the filter input. All default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Deserialize), serde(default))]
pub struct FilterOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub use_regex: bool,
}

/// How the expression text is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// The whole expression is a single literal or regex pattern.
    #[default]
    Pattern,
    /// The expression is a boolean combination of quoted keywords; lines are kept
    /// when the expression evaluates to true.
    Boolean,
}

/// One search request. Immutable once handed to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSpec {
    pub expression: String,
    pub options: FilterOptions,
    pub mode: MatchMode,
}

impl FilterSpec {
    pub fn new(expression: impl Into<String>, options: FilterOptions) -> Self {
        Self {
            expression: expression.into(),
            options,
            mode: MatchMode::Pattern,
        }
    }

    pub fn boolean(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            options: FilterOptions::default(),
            mode: MatchMode::Boolean,
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Outcome of validating or installing an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub message: String,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_all_false() {
        let options = FilterOptions::default();
        assert!(!options.case_sensitive);
        assert!(!options.whole_word);
        assert!(!options.use_regex);
    }

    #[test]
    fn test_spec_constructors() {
        let spec = FilterSpec::new("ERROR", FilterOptions::default());
        assert_eq!(spec.mode, MatchMode::Pattern);

        let spec = FilterSpec::boolean(r#""a" and "b""#);
        assert_eq!(spec.mode, MatchMode::Boolean);

        let spec = FilterSpec::new("x", FilterOptions::default()).with_mode(MatchMode::Boolean);
        assert_eq!(spec.mode, MatchMode::Boolean);
    }
}
