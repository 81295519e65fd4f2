use crate::value::Value;
use std::fmt::{self, Write as _};

///
/// NameWithModifier
///
/// A member or variable name plus the modifiers parsed in front of it.
/// Modifiers only change null and absence handling; they never change the
/// name that is resolved.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NameWithModifier {
    pub name: String,

    /// `o`: navigating through a null produced on this chain yields null.
    pub optional: bool,

    /// `x`: a missing member yields null and ends the chain.
    pub exists_optionally: bool,

    /// `as:<alias>`: display name for the resolved value.
    pub alias: Option<String>,
}

impl NameWithModifier {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub const fn exists_optionally(mut self) -> Self {
        self.exists_optionally = true;
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    const fn has_modifiers(&self) -> bool {
        self.optional || self.exists_optionally || self.alias.is_some()
    }

    fn fmt_modifiers(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_modifiers() {
            return Ok(());
        }

        let mut parts = Vec::with_capacity(3);
        if self.optional {
            parts.push("o".to_string());
        }
        if self.exists_optionally {
            parts.push("x".to_string());
        }
        if let Some(alias) = &self.alias {
            parts.push(format!("as:{alias}"));
        }

        write!(f, "({})", parts.join(","))
    }
}

///
/// Expr
///
/// Parsed path-expression node. Trees are immutable once parsed; `Chain`
/// and `Concat` never wrap a single element.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
    Attribute(NameWithModifier),
    Method {
        name: NameWithModifier,
        args: Vec<Self>,
    },
    Literal(Value),
    Variable(NameWithModifier),
    This,
    Concat(Vec<Self>),
    Chain(Vec<Self>),
}

impl Expr {
    /// Build a chain, collapsing the single-element case.
    #[must_use]
    pub fn chain(mut nodes: Vec<Self>) -> Self {
        if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            Self::Chain(nodes)
        }
    }

    /// Build a concatenation, collapsing the single-element case.
    #[must_use]
    pub fn concat(mut parts: Vec<Self>) -> Self {
        if parts.len() == 1 {
            parts.remove(0)
        } else {
            Self::Concat(parts)
        }
    }

    #[must_use]
    pub const fn modifier(&self) -> Option<&NameWithModifier> {
        match self {
            Self::Attribute(name) | Self::Variable(name) | Self::Method { name, .. } => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.modifier().is_some_and(|name| name.optional)
    }

    /// Whether this node reads from the current value.
    #[must_use]
    pub const fn needs_receiver(&self) -> bool {
        matches!(self, Self::Attribute(_) | Self::Method { .. })
    }

    /// Chain elements, or the node itself when it is not a chain.
    #[must_use]
    pub fn steps(&self) -> &[Self] {
        match self {
            Self::Chain(nodes) => nodes,
            other => std::slice::from_ref(other),
        }
    }
}

fn fmt_literal(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Text(text) => {
            f.write_char('\'')?;
            for c in text.chars() {
                match c {
                    '\'' => f.write_str("\\'")?,
                    '\\' => f.write_str("\\\\")?,
                    '\n' => f.write_str("\\n")?,
                    '\t' => f.write_str("\\t")?,
                    '\r' => f.write_str("\\r")?,
                    other => f.write_char(other)?,
                }
            }
            f.write_char('\'')
        }
        other => write!(f, "{other}"),
    }
}

fn fmt_joined(items: &[Expr], sep: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }

    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(name) => {
                name.fmt_modifiers(f)?;
                f.write_str(&name.name)
            }
            Self::Variable(name) => {
                name.fmt_modifiers(f)?;
                write!(f, "#{}", name.name)
            }
            Self::Method { name, args } => {
                name.fmt_modifiers(f)?;
                write!(f, "{}(", name.name)?;
                fmt_joined(args, ", ", f)?;
                f.write_char(')')
            }
            Self::Literal(value) => fmt_literal(value, f),
            Self::This => f.write_str("this"),
            Self::Concat(parts) => fmt_joined(parts, " + ", f),
            Self::Chain(nodes) => fmt_joined(nodes, ".", f),
        }
    }
}
