//! Path expressions: a small dotted-access language evaluated against
//! runtime objects (attributes, method calls, literals, `#variables`,
//! `this`, `+` concatenation and per-name modifiers).

mod assign;
mod ast;
mod context;
mod eval;
mod lexer;
mod parser;


use crate::config::SyntaxVersion;
use std::{fmt, str::FromStr};

// re-exports
pub use ast::{Expr, NameWithModifier};
pub use context::{EvalContext, HistoryEntry, Variables};
pub use eval::{EvalError, EvalErrorKind, PathEvaluator};
pub use parser::{ParseError, ParseErrorKind, parse};

///
/// PathExpr
///
/// Parsed expression together with the source text it came from.
/// Equality is structural; two spellings of the same tree compare equal.
///

#[derive(Clone, Debug)]
pub struct PathExpr {
    source: String,
    root: Expr,
}

impl PathExpr {
    pub fn parse(source: &str, syntax: SyntaxVersion) -> Result<Self, ParseError> {
        let root = parser::parse(source, syntax)?;

        Ok(Self {
            source: source.trim().to_string(),
            root,
        })
    }

    /// Wrap an already built tree; the source becomes its canonical text.
    #[must_use]
    pub fn from_expr(root: Expr) -> Self {
        Self {
            source: root.to_string(),
            root,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub const fn root(&self) -> &Expr {
        &self.root
    }

    /// Alias declared anywhere on the top-level chain, the last one winning,
    /// e.g. `city` for `(as:city)address.city`.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.root
            .steps()
            .iter()
            .rev()
            .find_map(|step| step.modifier().and_then(|name| name.alias.as_deref()))
    }
}

impl PartialEq for PathExpr {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Eq for PathExpr {}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl FromStr for PathExpr {
    type Err = ParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source, SyntaxVersion::default())
    }
}
