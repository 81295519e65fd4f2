//! Scanner for path-expression source text.

use crate::{
    path::parser::{ParseError, ParseErrorKind},
    value::{Float64, Value},
};
use std::{iter::Peekable, str::CharIndices};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Str(String),
    Number(Value),
    Dot,
    Comma,
    LeftParen,
    RightParen,
    Plus,
    Hash,
    Colon,
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

pub(crate) struct Scanner<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    start_pos: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            start_pos: 0,
        }
    }

    /// Scan all tokens, ending with `Eof`.
    pub(crate) fn scan_tokens(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.scan_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    fn scan_token(&mut self) -> Result<Token, ParseError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
        }
        self.start_pos = self.offset();

        let Some((_, c)) = self.chars.next() else {
            return Ok(self.make_token(TokenKind::Eof));
        };

        let kind = match c {
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '+' => TokenKind::Plus,
            '#' => TokenKind::Hash,
            ':' => TokenKind::Colon,
            '\'' | '"' => self.string(c)?,
            '-' if self.peek().is_some_and(|n| n.is_ascii_digit()) => self.number('-')?,
            c if c.is_ascii_digit() => self.number(c)?,
            c if is_ident_start(c) => self.identifier(c),
            other => return Err(self.error(ParseErrorKind::UnexpectedChar(other))),
        };

        Ok(self.make_token(kind))
    }

    fn string(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        let mut text = String::new();

        loop {
            match self.chars.next() {
                None => return Err(self.error(ParseErrorKind::UnterminatedString)),
                Some((_, c)) if c == quote => break,
                Some((_, '\\')) => match self.chars.next() {
                    None => return Err(self.error(ParseErrorKind::UnterminatedString)),
                    Some((_, 'n')) => text.push('\n'),
                    Some((_, 't')) => text.push('\t'),
                    Some((_, 'r')) => text.push('\r'),
                    // Quotes, backslash and anything else stand for themselves.
                    Some((_, other)) => text.push(other),
                },
                Some((_, c)) => text.push(c),
            }
        }

        Ok(TokenKind::Str(text))
    }

    // digits ['.' digits] [('e'|'E') ['+'|'-'] digits] ['L'|'D'|'F']
    fn number(&mut self, first: char) -> Result<TokenKind, ParseError> {
        let mut text = String::from(first);
        let mut is_float = false;

        self.digits(&mut text);

        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.push_next(&mut text);
            self.digits(&mut text);
            is_float = true;
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_follows = match self.peek_at(1) {
                Some('+' | '-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_follows {
                self.push_next(&mut text);
                if matches!(self.peek(), Some('+' | '-')) {
                    self.push_next(&mut text);
                }
                self.digits(&mut text);
                is_float = true;
            }
        }

        let suffix = match self.peek() {
            Some(c @ ('L' | 'l' | 'D' | 'd' | 'F' | 'f')) => {
                self.chars.next();
                Some(c.to_ascii_uppercase())
            }
            _ => None,
        };

        if self.peek().is_some_and(is_ident_part) {
            let lexeme = self.lexeme_with_tail();
            return Err(self.error(ParseErrorKind::InvalidNumber(lexeme)));
        }

        let value = match suffix {
            Some('L') if is_float => None,
            Some('L') => text.parse::<i64>().ok().map(Value::Int),
            Some(_) => parse_float(&text),
            None if is_float => parse_float(&text),
            None => text.parse::<i64>().ok().map(Value::Int),
        };

        match value {
            Some(value) => Ok(TokenKind::Number(value)),
            None => {
                let lexeme = self.lexeme();
                Err(self.error(ParseErrorKind::InvalidNumber(lexeme)))
            }
        }
    }

    fn identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::from(first);
        while self.peek().is_some_and(is_ident_part) {
            self.push_next(&mut name);
        }

        TokenKind::Ident(name)
    }

    fn digits(&mut self, text: &mut String) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.push_next(text);
        }
    }

    fn push_next(&mut self, text: &mut String) {
        if let Some((_, c)) = self.chars.next() {
            text.push(c);
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.source.len(), |&(i, _)| i)
    }

    fn lexeme(&mut self) -> String {
        let end = self.offset();
        self.source[self.start_pos..end].to_string()
    }

    // Lexeme including any identifier characters glued onto it.
    fn lexeme_with_tail(&mut self) -> String {
        while self.peek().is_some_and(is_ident_part) {
            self.chars.next();
        }
        self.lexeme()
    }

    const fn make_token(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            position: self.start_pos,
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.source, self.start_pos, kind)
    }
}

fn parse_float(text: &str) -> Option<Value> {
    text.parse::<f64>()
        .ok()
        .and_then(Float64::try_new)
        .map(Value::Float)
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

const fn is_ident_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source)
            .scan_tokens()
            .expect("source should scan")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn numeric_suffixes_select_the_literal_type() {
        assert_eq!(
            kinds("12L 12 1.5 2D 3f -4 1e3"),
            vec![
                TokenKind::Number(Value::Int(12)),
                TokenKind::Number(Value::Int(12)),
                TokenKind::Number(Value::float(1.5).expect("finite")),
                TokenKind::Number(Value::float(2.0).expect("finite")),
                TokenKind::Number(Value::float(3.0).expect("finite")),
                TokenKind::Number(Value::Int(-4)),
                TokenKind::Number(Value::float(1000.0).expect("finite")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn dot_after_integer_is_member_access() {
        assert_eq!(
            kinds("5.toString"),
            vec![
                TokenKind::Number(Value::Int(5)),
                TokenKind::Dot,
                TokenKind::Ident("toString".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn strings_accept_both_quotes_and_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\"b\n""#),
            vec![
                TokenKind::Str("it's".to_string()),
                TokenKind::Str("a\"b\n".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_reports_its_start() {
        let err = Scanner::new("name + 'abc")
            .scan_tokens()
            .expect_err("unterminated string should fail");

        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!(err.position, 7);
    }

    #[test]
    fn glued_identifier_makes_number_invalid() {
        let err = Scanner::new("12abc")
            .scan_tokens()
            .expect_err("12abc is not a number");

        assert_eq!(err.kind, ParseErrorKind::InvalidNumber("12abc".to_string()));
    }
}
