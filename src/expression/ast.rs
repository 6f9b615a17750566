//! Expression tree and line evaluation.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionNode {
    Keyword(String),
    And(Box<ExpressionNode>, Box<ExpressionNode>),
    Or(Box<ExpressionNode>, Box<ExpressionNode>),
}

impl ExpressionNode {
    pub fn keyword(text: impl Into<String>) -> Self {
        Self::Keyword(text.into())
    }

    pub fn and(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    /// Whether `line` satisfies the expression.
    ///
    /// Keywords are plain case-sensitive substring tests. Both children of an
    /// operator are always evaluated.
    pub fn evaluate(&self, line: &str) -> bool {
        match self {
            Self::Keyword(keyword) => line.contains(keyword.as_str()),
            Self::And(left, right) => {
                let left = left.evaluate(line);
                let right = right.evaluate(line);
                left & right
            }
            Self::Or(left, right) => {
                let left = left.evaluate(line);
                let right = right.evaluate(line);
                left | right
            }
        }
    }

    /// Keywords in source order, duplicates included.
    pub fn keywords(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_keywords(&mut out);
        out
    }

    fn collect_keywords<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Keyword(keyword) => out.push(keyword),
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect_keywords(out);
                right.collect_keywords(out);
            }
        }
    }
}

/// Renders a fully parenthesised expression that parses back to the same tree.
impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "\"{}\"", keyword),
            Self::And(left, right) => write!(f, "({} and {})", left, right),
            Self::Or(left, right) => write!(f, "({} or {})", left, right),
        }
    }
}
