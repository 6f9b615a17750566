//! Recursive-descent parser over lexed tokens.

use super::ast::ExpressionNode;
use super::lexer::{Token, TokenKind};
use super::ParseError;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// Byte length of the source, reported as the position of "end of expression".
    input_len: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, input_len: usize) -> Self {
        Self {
            tokens,
            current: 0,
            input_len,
        }
    }

    /// Parse the whole token stream. Leftover tokens after a complete expression
    /// are an error: a stray `)` is reported as unbalanced parentheses.
    pub fn parse(mut self) -> Result<ExpressionNode, ParseError> {
        let expr = self.parse_or()?;

        match self.peek() {
            None => Ok(expr),
            Some(token) if token.kind == TokenKind::RParen => Err(ParseError::UnbalancedParens {
                position: token.position,
            }),
            Some(token) => Err(ParseError::UnexpectedToken {
                token: Some(token.clone()),
                position: token.position,
            }),
        }
    }

    fn parse_or(&mut self) -> Result<ExpressionNode, ParseError> {
        let mut expr = self.parse_and()?;
        while self.eat(TokenKind::Or) {
            let right = self.parse_and()?;
            expr = ExpressionNode::or(expr, right);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<ExpressionNode, ParseError> {
        let mut expr = self.parse_primary()?;
        while self.eat(TokenKind::And) {
            let right = self.parse_primary()?;
            expr = ExpressionNode::and(expr, right);
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<ExpressionNode, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(ParseError::UnexpectedToken {
                token: None,
                position: self.input_len,
            });
        };

        match token.kind {
            TokenKind::LParen => {
                self.current += 1;
                let expr = self.parse_or()?;
                if !self.eat(TokenKind::RParen) {
                    return Err(ParseError::UnbalancedParens {
                        position: token.position,
                    });
                }
                Ok(expr)
            }
            TokenKind::Keyword => {
                self.current += 1;
                Ok(ExpressionNode::Keyword(token.text))
            }
            _ => Err(ParseError::UnexpectedToken {
                position: token.position,
                token: Some(token),
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().map(|token| token.kind) == Some(kind) {
            self.current += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::expression::{parse, ExpressionNode, ParseError};

    fn kw(text: &str) -> ExpressionNode {
        ExpressionNode::keyword(text)
    }

    #[test]
    fn test_single_keyword() {
        assert_eq!(parse(r#""timeout""#), Ok(kw("timeout")));
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let parsed = parse(r#""a" or "b" and "c""#).unwrap();
        assert_eq!(parsed, ExpressionNode::or(kw("a"), ExpressionNode::and(kw("b"), kw("c"))));
    }

    #[test]
    fn test_operators_are_left_associative() {
        let parsed = parse(r#""a" and "b" and "c""#).unwrap();
        assert_eq!(
            parsed,
            ExpressionNode::and(ExpressionNode::and(kw("a"), kw("b")), kw("c"))
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let parsed = parse(r#"("a" or "b") and "c""#).unwrap();
        assert_eq!(
            parsed,
            ExpressionNode::and(ExpressionNode::or(kw("a"), kw("b")), kw("c"))
        );
    }

    #[test]
    fn test_nested_parentheses() {
        let parsed = parse(r#""a" and ("b" or "c")"#).unwrap();
        assert!(parsed.evaluate("a c"));
        assert!(!parsed.evaluate("b c"));
    }

    #[test]
    fn test_extra_closing_paren_is_unbalanced() {
        assert_eq!(
            parse(r#""a" and ("b" or "c"))"#),
            Err(ParseError::UnbalancedParens { position: 20 })
        );
        assert!(parse(r#""a" and "b""#).is_ok());
    }

    #[test]
    fn test_missing_closing_paren_is_unbalanced() {
        assert_eq!(
            parse(r#"("a" or "b""#),
            Err(ParseError::UnbalancedParens { position: 0 })
        );
    }

    #[test]
    fn test_dangling_operator() {
        assert!(matches!(
            parse(r#""a" and"#),
            Err(ParseError::UnexpectedToken { token: None, position: 7 })
        ));
    }

    #[test]
    fn test_leading_operator() {
        assert!(matches!(
            parse(r#"or "a""#),
            Err(ParseError::UnexpectedToken { token: Some(_), position: 0 })
        ));
    }

    #[test]
    fn test_adjacent_keywords_are_rejected() {
        assert!(matches!(
            parse(r#""a" "b""#),
            Err(ParseError::UnexpectedToken { position: 4, .. })
        ));
    }

    #[test]
    fn test_empty_parens() {
        assert!(matches!(
            parse("()"),
            Err(ParseError::UnexpectedToken { position: 1, .. })
        ));
    }

    #[test]
    fn test_whitespace_only_expression() {
        assert!(matches!(
            parse("   "),
            Err(ParseError::UnexpectedToken { token: None, position: 3 })
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let source = r#""a" or "b" and ("c" or "d")"#;
        let parsed = parse(source).unwrap();
        let reparsed = parse(&parsed.to_string()).unwrap();
        assert_eq!(parsed, reparsed);
    }
}
