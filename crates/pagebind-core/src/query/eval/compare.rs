//! Builtin comparison semantics.

use crate::{
    query::{CompOp, CompOpKind, FilterCompare, QueryError, eval::LikeCache},
    value::{Value, numeric_eq, strict_order_cmp},
};
use std::{borrow::Cow, cmp::Ordering};

/// Evaluate one builtin comparison of `actual` against the literal.
pub(super) fn builtin(
    compare: &FilterCompare,
    actual: &Value,
    like: &mut LikeCache,
) -> Result<bool, QueryError> {
    let FilterCompare { attr, op, value } = compare;

    match &op.kind {
        CompOpKind::Equals => Ok(equals(op, actual, value)),
        CompOpKind::NotEquals => Ok(!equals(op, actual, value)),

        CompOpKind::Gt => order(compare, actual).map(Ordering::is_gt),
        CompOpKind::Ge => order(compare, actual).map(Ordering::is_ge),
        CompOpKind::Lt => order(compare, actual).map(Ordering::is_lt),
        CompOpKind::Le => order(compare, actual).map(Ordering::is_le),

        CompOpKind::IsNull => Ok(actual.is_null_or_blank()),

        CompOpKind::In => {
            let items = value
                .as_list()
                .ok_or_else(|| QueryError::InOperandNotCollection {
                    attr: attr.name().to_string(),
                    found: value.value_type(),
                })?;

            Ok(items.iter().any(|item| equals(op, actual, item)))
        }

        CompOpKind::StartsWith => text(compare, actual, |subject, arg| subject.starts_with(arg)),
        CompOpKind::Contains => text(compare, actual, |subject, arg| subject.contains(arg)),
        CompOpKind::NotContains => {
            text(compare, actual, |subject, arg| subject.contains(arg)).map(|found| !found)
        }
        CompOpKind::Like => {
            let pattern = text_operand(compare)?;
            match subject(op, actual) {
                Some(subject) => like.matches(&pattern, &subject),
                None => Ok(false),
            }
        }

        CompOpKind::Custom(_) => Err(QueryError::NoEvaluator {
            op: op.kind.clone(),
        }),
    }
}

// Null-safe equality; text honors the case and space flags.
fn equals(op: &CompOp, actual: &Value, literal: &Value) -> bool {
    match (actual, literal) {
        (Value::Text(a), Value::Text(b)) => normalize(op, a) == normalize(op, b),
        _ => numeric_eq(actual, literal),
    }
}

// Null orders below every non-null value.
fn order(compare: &FilterCompare, actual: &Value) -> Result<Ordering, QueryError> {
    let literal = &compare.value;
    if let (Value::Text(a), Value::Text(b)) = (actual, literal) {
        return Ok(normalize(&compare.op, a).cmp(&normalize(&compare.op, b)));
    }

    strict_order_cmp(actual, literal).ok_or_else(|| QueryError::Incomparable {
        attr: compare.attr.name().to_string(),
        left: actual.value_type(),
        right: literal.value_type(),
    })
}

// Null never contains or starts with anything.
fn text(
    compare: &FilterCompare,
    actual: &Value,
    test: impl Fn(&str, &str) -> bool,
) -> Result<bool, QueryError> {
    let arg = text_operand(compare)?;

    Ok(subject(&compare.op, actual).is_some_and(|subject| test(&subject, &arg)))
}

fn text_operand(compare: &FilterCompare) -> Result<String, QueryError> {
    match &compare.value {
        Value::Text(text) => Ok(normalize(&compare.op, text).into_owned()),
        other => Err(QueryError::TextOperand {
            attr: compare.attr.name().to_string(),
            op: compare.op.kind.clone(),
            found: other.value_type(),
        }),
    }
}

// Non-text values are matched on their rendered form.
fn subject(op: &CompOp, actual: &Value) -> Option<String> {
    match actual {
        Value::Null => None,
        Value::Text(text) => Some(normalize(op, text).into_owned()),
        other => Some(normalize(op, &other.to_concat_string()).into_owned()),
    }
}

fn normalize<'a>(op: &CompOp, text: &'a str) -> Cow<'a, str> {
    let mut text = Cow::Borrowed(text);
    if op.ignore_spaces {
        text = Cow::Owned(text.chars().filter(|c| !c.is_whitespace()).collect());
    }
    if op.ignore_case {
        text = Cow::Owned(text.to_lowercase());
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryAttr;

    fn cmp(op: impl Into<CompOp>, literal: impl Into<Value>, actual: impl Into<Value>) -> bool {
        let attr = QueryAttr::path("name").expect("path should parse");
        let compare = FilterCompare::new(attr, op, literal);

        builtin(&compare, &actual.into(), &mut LikeCache::default())
            .expect("comparison should evaluate")
    }

    #[test]
    fn equality_is_null_safe_and_widens_numbers() {
        assert!(cmp(CompOpKind::Equals, Value::Null, Value::Null));
        assert!(!cmp(CompOpKind::Equals, "a", Value::Null));
        assert!(cmp(CompOpKind::Equals, 2, Value::float(2.0).expect("finite")));
        assert!(cmp(CompOpKind::NotEquals, " ", "a"));
    }

    #[test]
    fn ordering_puts_null_below_everything() {
        assert!(cmp(CompOpKind::Lt, 0, Value::Null));
        assert!(cmp(CompOpKind::Ge, 3, 3));
        assert!(!cmp(CompOpKind::Gt, "b", "a"));
    }

    #[test]
    fn is_null_covers_blank_text() {
        assert!(cmp(CompOpKind::IsNull, Value::Null, "   "));
        assert!(cmp(CompOpKind::IsNull, Value::Null, Value::Null));
        assert!(!cmp(CompOpKind::IsNull, Value::Null, "x"));
    }

    #[test]
    fn text_flags_normalize_both_sides() {
        let op = CompOp::new(CompOpKind::StartsWith).ignore_case();
        assert!(cmp(op, "AB", "abc"));

        let op = CompOp::new(CompOpKind::Contains).ignore_spaces();
        assert!(cmp(op, "b c", "abcd"));

        assert!(cmp(CompOpKind::NotContains, "z", Value::Null));
        assert!(cmp(CompOp::new(CompOpKind::Like).ignore_case(), "A%", "abc"));
    }

    #[test]
    fn incompatible_operands_are_errors() {
        let attr = QueryAttr::path("name").expect("path should parse");
        let like = &mut LikeCache::default();

        let compare = FilterCompare::new(attr.clone(), CompOpKind::In, "x");
        let err = builtin(&compare, &Value::from("x"), like).expect_err("IN needs a list");
        assert!(matches!(err, QueryError::InOperandNotCollection { .. }));

        let compare = FilterCompare::new(attr.clone(), CompOpKind::Gt, 1);
        let err = builtin(&compare, &Value::from("x"), like).expect_err("text vs int is unordered");
        assert!(matches!(err, QueryError::Incomparable { .. }));

        let compare = FilterCompare::new(attr, CompOp::custom("NEAR"), 1);
        let err = builtin(&compare, &Value::Int(1), like).expect_err("custom has no builtin");
        assert!(matches!(err, QueryError::NoEvaluator { .. }));
    }
}
