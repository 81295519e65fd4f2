use crate::{
    query::QueryAttr,
    value::{Value, canonical_cmp, strict_order_cmp},
};
use derive_more::{Deref, IntoIterator};
use std::{cmp::Ordering, fmt, sync::Arc};

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

type CompareFn = dyn Fn(&Value, &Value) -> Ordering + Send + Sync;

///
/// Comparator
///
/// Ascending comparison for one sort key. The default is the natural order:
/// null first, numbers widened, then the canonical order for anything the
/// strict order cannot rank. Direction is applied outside the comparator,
/// so reversing never wraps it.
///

#[derive(Clone, Default)]
pub struct Comparator(Option<Arc<CompareFn>>);

impl Comparator {
    #[must_use]
    pub fn natural() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn custom(f: impl Fn(&Value, &Value) -> Ordering + Send + Sync + 'static) -> Self {
        Self(Some(Arc::new(f)))
    }

    #[must_use]
    pub fn compare(&self, left: &Value, right: &Value) -> Ordering {
        match &self.0 {
            Some(f) => f(left, right),
            None => natural_cmp(left, right),
        }
    }
}

/// Natural ascending order used by sort keys without a custom comparator.
#[must_use]
pub fn natural_cmp(left: &Value, right: &Value) -> Ordering {
    strict_order_cmp(left, right).unwrap_or_else(|| canonical_cmp(left, right))
}

impl PartialEq for Comparator {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Comparator {}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() { "Custom" } else { "Natural" })
    }
}

///
/// SortKey
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortKey {
    pub attr: QueryAttr,
    pub direction: SortDirection,
    pub comparator: Comparator,
}

impl SortKey {
    #[must_use]
    pub fn asc(attr: impl Into<QueryAttr>) -> Self {
        Self::new(attr, SortDirection::Asc)
    }

    #[must_use]
    pub fn desc(attr: impl Into<QueryAttr>) -> Self {
        Self::new(attr, SortDirection::Desc)
    }

    #[must_use]
    pub fn new(attr: impl Into<QueryAttr>, direction: SortDirection) -> Self {
        Self {
            attr: attr.into(),
            direction,
            comparator: Comparator::natural(),
        }
    }

    #[must_use]
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    #[must_use]
    pub fn compare(&self, left: &Value, right: &Value) -> Ordering {
        self.direction.apply(self.comparator.compare(left, right))
    }
}

///
/// SortOrder
///
/// Multi-key order; the first key dominates.
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, PartialEq)]
pub struct SortOrder {
    #[into_iterator(owned, ref)]
    keys: Vec<SortKey>,
}

impl SortOrder {
    #[must_use]
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    #[must_use]
    pub fn then(mut self, key: SortKey) -> Self {
        self.keys.push(key);
        self
    }

    /// Flip every key's direction. Reversing twice restores the original.
    #[must_use]
    pub fn reverse(&self) -> Self {
        Self {
            keys: self
                .keys
                .iter()
                .map(|key| SortKey {
                    direction: key.direction.reverse(),
                    ..key.clone()
                })
                .collect(),
        }
    }

    /// Compare two pre-extracted key rows, one value per key.
    #[must_use]
    pub fn compare_values(&self, left: &[Value], right: &[Value]) -> Ordering {
        self.keys
            .iter()
            .zip(left.iter().zip(right))
            .map(|(key, (l, r))| key.compare(l, r))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl From<SortKey> for SortOrder {
    fn from(key: SortKey) -> Self {
        Self { keys: vec![key] }
    }
}

impl FromIterator<SortKey> for SortOrder {
    fn from_iter<I: IntoIterator<Item = SortKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(path: &str) -> SortKey {
        SortKey::asc(QueryAttr::path(path).expect("path should parse"))
    }

    #[test]
    fn reverse_twice_restores_the_original() {
        let by_len = Comparator::custom(|a, b| {
            a.to_concat_string().len().cmp(&b.to_concat_string().len())
        });
        let order = SortOrder::from(key("name").with_comparator(by_len)).then(key("age"));

        let twice = order.reverse().reverse();
        assert_eq!(twice, order, "comparator instances should be shared, not wrapped");
        assert_ne!(order.reverse(), order);
    }

    #[test]
    fn nulls_sort_first_ascending() {
        let order = SortOrder::from(key("name"));

        assert_eq!(
            order.compare_values(&[Value::Null], &[Value::from("a")]),
            Ordering::Less
        );
        assert_eq!(
            order.reverse().compare_values(&[Value::Null], &[Value::from("a")]),
            Ordering::Greater
        );
    }

    #[test]
    fn first_key_dominates() {
        let order = SortOrder::from(key("a")).then(SortKey::desc(
            QueryAttr::path("b").expect("path should parse"),
        ));

        let left = [Value::Int(1), Value::Int(1)];
        let right = [Value::Int(1), Value::Int(2)];
        assert_eq!(order.compare_values(&left, &right), Ordering::Greater);

        let right = [Value::Int(2), Value::Int(0)];
        assert_eq!(order.compare_values(&left, &right), Ordering::Less);
    }

    proptest! {
        #[test]
        fn natural_order_is_antisymmetric(a in -50i64..50, b in -50.0f64..50.0) {
            let left = Value::Int(a);
            let right = Value::float(b).expect("finite float should build");

            prop_assert_eq!(
                natural_cmp(&left, &right),
                natural_cmp(&right, &left).reverse()
            );
        }
    }
}
