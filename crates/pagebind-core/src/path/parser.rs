//! Recursive-descent parser for path expressions.
//!
//! expr     := term ('+' term)*
//! term     := start ('.' member)*
//! start    := literal | 'this' | member
//! member   := modifiers? '#'? name ('(' (expr (',' expr)*)? ')')?
//! modifiers:= '(' modifier (',' modifier)* ')'
//! modifier := 'o' | 'x' | 'as' ':' name

use crate::{
    config::SyntaxVersion,
    path::{
        ast::{Expr, NameWithModifier},
        lexer::{Scanner, Token, TokenKind},
    },
    value::Value,
};
use thiserror::Error as ThisError;

///
/// ParseError
///
/// Fatal parse failure with the byte offset of the offending token.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{kind} at position {position} in '{expression}'")]
pub struct ParseError {
    pub expression: String,
    pub position: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(source: &str, position: usize, kind: ParseErrorKind) -> Self {
        Self {
            expression: source.to_string(),
            position,
            kind,
        }
    }
}

///
/// ParseErrorKind
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ParseErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("missing closing parenthesis")]
    MissingClosingParen,

    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),

    #[error("alias modifier given more than once")]
    DuplicateAlias,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("trailing input after expression")]
    TrailingInput,
}

/// Parse `source` into an expression tree.
pub fn parse(source: &str, syntax: SyntaxVersion) -> Result<Expr, ParseError> {
    let tokens = Scanner::new(source).scan_tokens()?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        syntax,
    };

    let expr = parser.expr()?;
    if !parser.check(&TokenKind::Eof) {
        return Err(parser.error(ParseErrorKind::TrailingInput));
    }

    Ok(expr)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    syntax: SyntaxVersion,
}

impl Parser<'_> {
    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut terms = vec![self.term()?];
        while self.eat(&TokenKind::Plus) {
            terms.push(self.term()?);
        }

        Ok(Expr::concat(terms))
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut nodes = vec![self.start()?];
        while self.eat(&TokenKind::Dot) {
            nodes.push(self.member()?);
        }

        Ok(Expr::chain(nodes))
    }

    // Literals win over identifiers: strings, numbers, then reserved words.
    fn start(&mut self) -> Result<Expr, ParseError> {
        let start = match &self.peek().kind {
            TokenKind::Str(text) => Some(Expr::Literal(Value::Text(text.clone()))),
            TokenKind::Number(value) => Some(Expr::Literal(value.clone())),
            TokenKind::Ident(word) => match word.as_str() {
                "true" => Some(Expr::Literal(Value::Bool(true))),
                "false" => Some(Expr::Literal(Value::Bool(false))),
                "null" => Some(Expr::Literal(Value::Null)),
                "this" => Some(Expr::This),
                _ => None,
            },
            _ => None,
        };

        match start {
            Some(expr) => {
                self.advance();
                Ok(expr)
            }
            None => self.member(),
        }
    }

    fn member(&mut self) -> Result<Expr, ParseError> {
        let mut name = if self.check(&TokenKind::LeftParen) {
            self.modifiers()?
        } else {
            NameWithModifier::default()
        };

        let variable = self.eat(&TokenKind::Hash);
        name.name = self.identifier()?;

        if self.check(&TokenKind::LeftParen) {
            if variable {
                return Err(self.unexpected());
            }
            let args = self.arguments()?;

            return Ok(Expr::Method { name, args });
        }

        if variable {
            Ok(Expr::Variable(name))
        } else {
            Ok(Expr::Attribute(name))
        }
    }

    fn modifiers(&mut self) -> Result<NameWithModifier, ParseError> {
        self.advance(); // '('
        let mut name = NameWithModifier::default();

        loop {
            let position = self.peek().position;
            let modifier = self.identifier()?;

            match (modifier.as_str(), self.syntax) {
                ("o" | "x", SyntaxVersion::V1) => {
                    name.optional = true;
                    name.exists_optionally = true;
                }
                ("o", SyntaxVersion::V2) => name.optional = true,
                ("x", SyntaxVersion::V2) => name.exists_optionally = true,
                ("as", _) => {
                    if !self.eat(&TokenKind::Colon) {
                        return Err(self.unexpected());
                    }
                    let alias = self.identifier()?;
                    if name.alias.is_some() {
                        return Err(self.error_at(position, ParseErrorKind::DuplicateAlias));
                    }
                    name.alias = Some(alias);
                }
                _ => {
                    let kind = ParseErrorKind::UnknownModifier(modifier.clone());
                    return Err(self.error_at(position, kind));
                }
            }

            if self.eat(&TokenKind::Comma) {
                continue;
            }
            if self.eat(&TokenKind::RightParen) {
                return Ok(name);
            }

            return Err(self.missing_paren());
        }
    }

    // A missing ')' here is a hard failure.
    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.advance(); // '('
        let mut args = Vec::new();

        if self.eat(&TokenKind::RightParen) {
            return Ok(args);
        }

        loop {
            args.push(self.expr()?);

            if self.eat(&TokenKind::Comma) {
                continue;
            }
            if self.eat(&TokenKind::RightParen) {
                return Ok(args);
            }

            return Err(self.missing_paren());
        }
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn peek(&self) -> &Token {
        // The scanner always terminates the stream with `Eof`.
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    const fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> ParseError {
        let kind = match &self.peek().kind {
            TokenKind::Eof => ParseErrorKind::UnexpectedEnd,
            other => ParseErrorKind::UnexpectedToken(describe(other)),
        };

        self.error(kind)
    }

    fn missing_paren(&self) -> ParseError {
        self.error(ParseErrorKind::MissingClosingParen)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(self.peek().position, kind)
    }

    fn error_at(&self, position: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.source, position, kind)
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(name) => format!("identifier '{name}'"),
        TokenKind::Str(text) => format!("string '{text}'"),
        TokenKind::Number(value) => format!("number '{value}'"),
        TokenKind::Dot => "'.'".to_string(),
        TokenKind::Comma => "','".to_string(),
        TokenKind::LeftParen => "'('".to_string(),
        TokenKind::RightParen => "')'".to_string(),
        TokenKind::Plus => "'+'".to_string(),
        TokenKind::Hash => "'#'".to_string(),
        TokenKind::Colon => "':'".to_string(),
        TokenKind::Eof => "end of expression".to_string(),
    }
}
