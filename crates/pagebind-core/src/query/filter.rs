use crate::{
    query::{CompOp, QueryAttr},
    value::Value,
};
use std::{
    fmt,
    ops::{BitAnd, BitOr, Not},
};

///
/// FilterCompare
///
/// Leaf comparison `attr OP literal`. Unary operators ignore the literal.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FilterCompare {
    pub attr: QueryAttr,
    pub op: CompOp,
    pub value: Value,
}

impl FilterCompare {
    #[must_use]
    pub fn new(attr: impl Into<QueryAttr>, op: impl Into<CompOp>, value: impl Into<Value>) -> Self {
        Self {
            attr: attr.into(),
            op: op.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for FilterCompare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.op.kind.is_unary() {
            return write!(f, "{} {}", self.attr, self.op);
        }

        match &self.value {
            Value::Text(text) => write!(f, "{} {} {text:?}", self.attr, self.op),
            other => write!(f, "{} {} {other}", self.attr, self.op),
        }
    }
}

///
/// FilterExpr
///
/// Filter tree owned by query params. `And` and `Or` must have at least one
/// child; an empty junction is rejected at evaluation time.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterExpr {
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare(FilterCompare),
}

impl FilterExpr {
    #[must_use]
    pub fn compare(
        attr: impl Into<QueryAttr>,
        op: impl Into<CompOp>,
        value: impl Into<Value>,
    ) -> Self {
        Self::Compare(FilterCompare::new(attr, op, value))
    }

    /// Conjunction that flattens nested `And` nodes.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::And(mut a), Self::And(b)) => {
                a.extend(b);
                Self::And(a)
            }
            (Self::And(mut a), b) => {
                a.push(b);
                Self::And(a)
            }
            (a, Self::And(mut b)) => {
                b.insert(0, a);
                Self::And(b)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    /// Disjunction that flattens nested `Or` nodes.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Or(mut a), Self::Or(b)) => {
                a.extend(b);
                Self::Or(a)
            }
            (Self::Or(mut a), b) => {
                a.push(b);
                Self::Or(a)
            }
            (a, Self::Or(mut b)) => {
                b.insert(0, a);
                Self::Or(b)
            }
            (a, b) => Self::Or(vec![a, b]),
        }
    }

    #[must_use]
    #[expect(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Visit every comparison leaf, depth-first.
    pub fn for_each_compare<'a>(&'a self, f: &mut impl FnMut(&'a FilterCompare)) {
        match self {
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.for_each_compare(f);
                }
            }
            Self::Not(child) => child.for_each_compare(f),
            Self::Compare(compare) => f(compare),
        }
    }
}

impl From<FilterCompare> for FilterExpr {
    fn from(compare: FilterCompare) -> Self {
        Self::Compare(compare)
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let junction = |f: &mut fmt::Formatter<'_>, children: &[Self], sep: &str| {
            f.write_str("(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")
        };

        match self {
            Self::And(children) => junction(f, children, "AND"),
            Self::Or(children) => junction(f, children, "OR"),
            Self::Not(child) => write!(f, "NOT {child}"),
            Self::Compare(compare) => write!(f, "{compare}"),
        }
    }
}

///
/// Bit Operations
/// `&`, `|` and `!` build junctions and negation
///

impl BitAnd for FilterExpr {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for FilterExpr {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl Not for FilterExpr {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CompOpKind;

    fn name_is(value: &str) -> FilterExpr {
        let attr = QueryAttr::path("name").expect("path should parse");
        FilterExpr::compare(attr, CompOpKind::Equals, value)
    }

    #[test]
    fn junctions_flatten() {
        let expr = name_is("a") & name_is("b") & name_is("c");

        let FilterExpr::And(children) = &expr else {
            panic!("expected a flat AND, got {expr}");
        };
        assert_eq!(children.len(), 3);
    }

    #[test]
    fn display_renders_infix_form() {
        let expr = !(name_is("a") | name_is("b"));

        assert_eq!(
            expr.to_string(),
            "NOT (name EQUALS \"a\" OR name EQUALS \"b\")"
        );
    }

    #[test]
    fn compare_leaves_are_visited_in_order() {
        let expr = name_is("a") & !name_is("b");
        let mut seen = Vec::new();
        expr.for_each_compare(&mut |compare| seen.push(compare.value.clone()));

        assert_eq!(seen, vec![Value::from("a"), Value::from("b")]);
    }
}
