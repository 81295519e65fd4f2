use crate::value::{Value, canonical_cmp, strict_order_cmp};
use std::{cmp::Ordering, fmt};

///
/// CompositeValue
///
/// Synthetic value of a composite attribute: ordered `(part name, value)`
/// pairs. Equality, hashing and ordering are part-wise in declared order.
///

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct CompositeValue {
    parts: Vec<(String, Value)>,
}

impl CompositeValue {
    #[must_use]
    pub const fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Append one named part.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parts.push((name.into(), value.into()));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.parts.push((name.into(), value));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.parts
            .iter()
            .find(|(part, _)| part == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn parts(&self) -> &[(String, Value)] {
        &self.parts
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Part-wise strict comparison; `None` when any part pair is not orderable
    /// or the part layouts differ.
    pub(crate) fn strict_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.parts.len() != other.parts.len() {
            return None;
        }

        for ((left_name, left), (right_name, right)) in self.parts.iter().zip(&other.parts) {
            if left_name != right_name {
                return None;
            }
            let cmp = strict_order_cmp(left, right)?;
            if cmp != Ordering::Equal {
                return Some(cmp);
            }
        }

        Some(Ordering::Equal)
    }
}

impl Ord for CompositeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        for ((left_name, left), (right_name, right)) in self.parts.iter().zip(&other.parts) {
            let cmp = left_name
                .cmp(right_name)
                .then_with(|| canonical_cmp(left, right));
            if cmp != Ordering::Equal {
                return cmp;
            }
        }

        self.parts.len().cmp(&other.parts.len())
    }
}

impl PartialOrd for CompositeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CompositeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (name, value)) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}
