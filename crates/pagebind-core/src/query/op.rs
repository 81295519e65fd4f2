use crate::traits::Localizer;
use convert_case::{Case, Casing};
use std::{borrow::Cow, fmt};

///
/// CompOpKind
///
/// Closed set of builtin comparison kinds plus named custom kinds that are
/// evaluated by a handler registered on the evaluator.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CompOpKind {
    Equals,
    NotEquals,
    Gt,
    Ge,
    Lt,
    Le,
    IsNull,
    In,
    StartsWith,
    Contains,
    NotContains,
    Like,
    Custom(Cow<'static, str>),
}

impl CompOpKind {
    pub const BUILTIN: [Self; 12] = [
        Self::Equals,
        Self::NotEquals,
        Self::Gt,
        Self::Ge,
        Self::Lt,
        Self::Le,
        Self::IsNull,
        Self::In,
        Self::StartsWith,
        Self::Contains,
        Self::NotContains,
        Self::Like,
    ];

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Equals => "EQUALS",
            Self::NotEquals => "NOT_EQUALS",
            Self::Gt => "GT",
            Self::Ge => "GE",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::IsNull => "IS_NULL",
            Self::In => "IN",
            Self::StartsWith => "STARTS_WITH",
            Self::Contains => "CONTAINS",
            Self::NotContains => "NOT_CONTAINS",
            Self::Like => "LIKE",
            Self::Custom(name) => name,
        }
    }

    /// Whether the operator ignores its literal operand.
    #[must_use]
    pub const fn is_unary(&self) -> bool {
        matches!(self, Self::IsNull)
    }

    /// Whether the operator works on text and honors case/space flags.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(
            self,
            Self::StartsWith | Self::Contains | Self::NotContains | Self::Like
        )
    }
}

impl fmt::Display for CompOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

///
/// CompOp
///
/// A comparison kind with its text-matching flags.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CompOp {
    pub kind: CompOpKind,
    pub ignore_case: bool,
    pub ignore_spaces: bool,
}

impl CompOp {
    #[must_use]
    pub const fn new(kind: CompOpKind) -> Self {
        Self {
            kind,
            ignore_case: false,
            ignore_spaces: false,
        }
    }

    #[must_use]
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(CompOpKind::Custom(name.into()))
    }

    #[must_use]
    pub const fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    #[must_use]
    pub const fn ignore_spaces(mut self) -> Self {
        self.ignore_spaces = true;
        self
    }

    /// Localized title under `op.<NAME>`, else the name in title case.
    #[must_use]
    pub fn title(&self, localizer: &dyn Localizer) -> String {
        let name = self.kind.name();

        localizer
            .localize(&format!("op.{name}"))
            .unwrap_or_else(|| name.to_case(Case::Title))
    }
}

impl From<CompOpKind> for CompOp {
    fn from(kind: CompOpKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.ignore_case {
            f.write_str("[ci]")?;
        }
        if self.ignore_spaces {
            f.write_str("[is]")?;
        }

        Ok(())
    }
}
