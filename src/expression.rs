//! Boolean keyword expressions.
//!
//! An expression combines double-quoted keywords with case-insensitive `and` / `or`
//! operators and parentheses:
//!
//! ```text
//! expr    := or
//! or      := and ( "or" and )*
//! and     := primary ( "and" primary )*
//! primary := "(" expr ")" | KEYWORD
//! ```
//!
//! `or` binds looser than `and`. Parsing never panics: every malformed input resolves
//! to a [`ParseError`] carrying a human-readable message.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::ExpressionNode;
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::Parser;

use crate::filter::Validation;
use thiserror::Error;

/// Reasons an expression can be rejected. Positions are byte offsets into the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("keyword starting at position {position} is missing its closing quote")]
    UnterminatedKeyword { position: usize },

    #[error("illegal character '{character}' at position {position}")]
    IllegalCharacter { character: char, position: usize },

    #[error("unbalanced parentheses at position {position}")]
    UnbalancedParens { position: usize },

    #[error("unexpected {} at position {position}", describe_token(.token.as_ref()))]
    UnexpectedToken {
        token: Option<Token>,
        position: usize,
    },
}

fn describe_token(token: Option<&Token>) -> String {
    match token {
        Some(token) => format!("token '{}'", token.text),
        None => "end of expression".to_string(),
    }
}

/// Parse `expression` into an AST.
pub fn parse(expression: &str) -> Result<ExpressionNode, ParseError> {
    let tokens = tokenize(expression)?;
    Parser::new(tokens, expression.len()).parse()
}

/// Parse and discard the AST, reporting only whether the expression is well formed.
pub fn validate(expression: &str) -> Validation {
    match parse(expression) {
        Ok(_) => Validation::ok(),
        Err(err) => Validation::invalid(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reports_messages() {
        let ok = validate(r#""a" and "b""#);
        assert!(ok.valid);

        let bad = validate(r#""a" and "b"#);
        assert!(!bad.valid);
        assert!(bad.message.contains("closing quote"));
    }

    #[test]
    fn test_unexpected_end_message() {
        let err = parse("").unwrap_err();
        assert_eq!(err.to_string(), "unexpected end of expression at position 0");
    }

    #[test]
    fn test_unexpected_token_message_names_token() {
        let err = parse(r#""a" and or "b""#).unwrap_err();
        assert_eq!(err.to_string(), "unexpected token 'or' at position 8");
    }
}
