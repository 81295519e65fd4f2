use crate::value::Value;
use std::cmp::Ordering;

/// Total canonical comparator used by sorting, id sets and `Value: Ord`.
///
/// Ordering rules:
/// 1. Canonical variant rank (`Null` lowest)
/// 2. Variant-specific comparison for same-ranked values
///
/// Mixed-variant comparisons are rank-only and must remain deterministic.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let rank = left.canonical_rank().cmp(&right.canonical_rank());
    if rank != Ordering::Equal {
        return rank;
    }

    canonical_cmp_same_rank(left, right)
}

/// Strict comparator for orderable values.
///
/// `Int` and `Float` widen to a numeric comparison. `Null` orders below
/// every non-null value. Returns `None` for mismatched or non-orderable
/// variants.
#[must_use]
pub fn strict_order_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => Some(a.cmp(b)),
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            let (a, b) = (left.as_f64()?, right.as_f64()?);
            a.partial_cmp(&b)
        }
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Composite(a), Value::Composite(b)) => a.strict_cmp(b),
        _ => None,
    }
}

/// Null-safe equality with numeric widening between `Int` and `Float`.
#[must_use]
pub fn numeric_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            matches!((left.as_f64(), right.as_f64()), (Some(a), Some(b)) if a == b)
        }
        _ => left == right,
    }
}

fn canonical_cmp_same_rank(left: &Value, right: &Value) -> Ordering {
    #[allow(clippy::match_same_arms)]
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::List(a), Value::List(b)) => canonical_cmp_value_list(a, b),
        (Value::Composite(a), Value::Composite(b)) => a.cmp(b),
        (Value::Object(a), Value::Object(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

fn canonical_cmp_value_list(left: &[Value], right: &[Value]) -> Ordering {
    for (left, right) in left.iter().zip(right.iter()) {
        let cmp = canonical_cmp(left, right);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    left.len().cmp(&right.len())
}
