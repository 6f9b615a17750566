//! Tokenizer for keyword expressions.

use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    And,
    Or,
    LParen,
    RParen,
}

/// A lexed token. For keywords `text` is the content between the quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

/// Split `input` into tokens, left to right.
///
/// Whitespace is insignificant. `and` / `or` are matched case-insensitively as bare
/// words; anything else outside quotes and parentheses is an illegal character.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        match ch {
            '"' => {
                let body_start = position + 1;
                let close = input[body_start..]
                    .find('"')
                    .ok_or(ParseError::UnterminatedKeyword { position })?;
                let body_end = body_start + close;
                tokens.push(Token::new(
                    TokenKind::Keyword,
                    &input[body_start..body_end],
                    position,
                ));
                // Skip past the closing quote.
                while chars.next_if(|&(idx, _)| idx <= body_end).is_some() {}
            }
            '(' => {
                tokens.push(Token::new(TokenKind::LParen, "(", position));
                chars.next();
            }
            ')' => {
                tokens.push(Token::new(TokenKind::RParen, ")", position));
                chars.next();
            }
            _ => {
                let rest = &input[position..];
                let (kind, word) = if starts_with_word(rest, "and") {
                    (TokenKind::And, "and")
                } else if starts_with_word(rest, "or") {
                    (TokenKind::Or, "or")
                } else {
                    return Err(ParseError::IllegalCharacter {
                        character: ch,
                        position,
                    });
                };
                tokens.push(Token::new(kind, word, position));
                // Operators are ASCII, so one char per byte.
                for _ in 0..word.len() {
                    chars.next();
                }
            }
        }
    }

    Ok(tokens)
}

fn starts_with_word(rest: &str, word: &str) -> bool {
    rest.get(..word.len())
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case(word))
}
