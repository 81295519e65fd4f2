//! Selection tracking: the `Selection` snapshot, selection modes and the
//! handler that applies changes with veto and change notification.

mod handler;

use crate::{query::QueryParams, value::Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

// re-exports
pub use handler::{SelectionHandler, SelectionListener};

///
/// SelectMode
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    None,
    Single,
    #[default]
    Multi,
}

///
/// SelectionError
///
/// Operation not legal under the handler's select mode.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SelectionError {
    #[error("selection is disabled")]
    Disabled,

    #[error("single selection mode cannot select {requested} items")]
    SingleMode { requested: usize },

    #[error("'{operation}' requires multi selection mode")]
    MultiOnly { operation: &'static str },
}

///
/// Selection
///
/// Immutable snapshot of selected item ids.
///
/// Explicit   → exactly the listed ids
/// AllExcept  → every item matching `universe` except `excluded`, plus the
///              `included` ids of items outside it; built in O(1) without
///              enumerating the universe
///
/// Whether an item belongs to the universe is decided by the owning
/// collection, so membership tests take that answer as an argument.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Selection {
    Explicit(BTreeSet<Value>),
    AllExcept {
        universe: QueryParams,
        universe_size: usize,
        excluded: BTreeSet<Value>,
        included: BTreeSet<Value>,
    },
}

impl Selection {
    #[must_use]
    pub const fn empty() -> Self {
        Self::Explicit(BTreeSet::new())
    }

    /// Everything in `universe`, which holds `universe_size` items.
    #[must_use]
    pub const fn all(universe: QueryParams, universe_size: usize) -> Self {
        Self::AllExcept {
            universe,
            universe_size,
            excluded: BTreeSet::new(),
            included: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn explicit(ids: impl IntoIterator<Item = Value>) -> Self {
        Self::Explicit(ids.into_iter().collect())
    }

    /// The recorded universe of an "all except" selection.
    #[must_use]
    pub const fn universe(&self) -> Option<&QueryParams> {
        match self {
            Self::Explicit(_) => None,
            Self::AllExcept { universe, .. } => Some(universe),
        }
    }

    /// Membership of `id`, treating it as part of the universe.
    #[must_use]
    pub fn contains(&self, id: &Value) -> bool {
        self.contains_member(id, true)
    }

    /// Membership of `id`; `in_universe` says whether its item matches the
    /// recorded universe. Explicit selections ignore it.
    #[must_use]
    pub fn contains_member(&self, id: &Value, in_universe: bool) -> bool {
        match self {
            Self::Explicit(ids) => ids.contains(id),
            Self::AllExcept { excluded, .. } if in_universe => !excluded.contains(id),
            Self::AllExcept { included, .. } => included.contains(id),
        }
    }

    /// Number of selected items. `excluded` only ever holds universe
    /// members, so the count stays exact.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Explicit(ids) => ids.len(),
            Self::AllExcept {
                universe_size,
                excluded,
                included,
                ..
            } => universe_size
                .saturating_sub(excluded.len())
                .saturating_add(included.len()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn is_complement(&self) -> bool {
        matches!(self, Self::AllExcept { .. })
    }

    /// Copy with `ids` added (`select`) or removed, treating every id as
    /// part of the universe.
    #[must_use]
    pub fn with(&self, select: bool, ids: impl IntoIterator<Item = Value>) -> Self {
        self.with_members(select, ids, |_| true)
    }

    /// Copy with `ids` added (`select`) or removed. For an "all except"
    /// selection, ids of universe members toggle the exclusions and all
    /// others toggle the extra inclusions.
    #[must_use]
    pub fn with_members(
        &self,
        select: bool,
        ids: impl IntoIterator<Item = Value>,
        in_universe: impl Fn(&Value) -> bool,
    ) -> Self {
        let mut next = self.clone();
        for id in ids {
            let set = match &mut next {
                Self::Explicit(set) => set,
                Self::AllExcept { excluded, .. } if in_universe(&id) => {
                    // an exclusion selects by being absent
                    if select {
                        excluded.remove(&id);
                    } else {
                        excluded.insert(id);
                    }
                    continue;
                }
                Self::AllExcept { included, .. } => included,
            };

            if select {
                set.insert(id);
            } else {
                set.remove(&id);
            }
        }

        next
    }

    /// Complement within a universe. Items outside the universe keep their
    /// state, so inverting twice restores the original.
    ///
    /// An explicit selection becomes "all of `universe` except the selected
    /// members"; an "all except" selection inverts within its own recorded
    /// universe and the arguments are ignored.
    #[must_use]
    pub fn inverted(
        &self,
        universe: QueryParams,
        universe_size: usize,
        in_universe: impl Fn(&Value) -> bool,
    ) -> Self {
        match self {
            Self::Explicit(ids) => {
                let (excluded, included) = ids.iter().cloned().partition(&in_universe);

                Self::AllExcept {
                    universe,
                    universe_size,
                    excluded,
                    included,
                }
            }
            Self::AllExcept {
                excluded, included, ..
            } => Self::Explicit(excluded.union(included).cloned().collect()),
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn odd(id: &Value) -> bool {
        matches!(id, Value::Int(n) if n % 2 == 1)
    }

    #[test]
    fn all_except_answers_size_and_membership() {
        let all = Selection::all(QueryParams::new(), 1_000_000).with(false, [Value::Int(5)]);

        assert!(!all.contains(&Value::Int(5)));
        assert!(all.contains(&Value::Int(6)));
        assert_eq!(all.len(), 999_999);
    }

    #[test]
    fn outside_ids_do_not_count_as_exclusions() {
        // universe: the 3 odd ids of 1..=6
        let all = Selection::all(QueryParams::new(), 3);

        let next = all.with_members(false, [Value::Int(2), Value::Int(3)], odd);
        assert_eq!(next.len(), 2, "only the member 3 is excluded");
        assert!(!next.contains_member(&Value::Int(2), false));
        assert!(!next.contains_member(&Value::Int(3), true));
        assert!(next.contains_member(&Value::Int(1), true));

        let next = next.with_members(true, [Value::Int(4)], odd);
        assert_eq!(next.len(), 3);
        assert!(next.contains_member(&Value::Int(4), false));
        assert!(!next.contains_member(&Value::Int(6), false));
    }

    #[test]
    fn invert_twice_restores_explicit_ids() {
        let picked = Selection::explicit([Value::Int(1), Value::Int(2)]);
        let inverted = picked.inverted(QueryParams::new(), 10, |_| true);

        assert!(inverted.is_complement());
        assert_eq!(inverted.len(), 8);
        assert!(!inverted.contains(&Value::Int(1)));
        assert_eq!(inverted.inverted(QueryParams::new(), 10, |_| true), picked);
    }

    #[test]
    fn invert_keeps_ids_outside_the_universe() {
        let picked = Selection::explicit([Value::Int(1), Value::Int(2)]);
        let inverted = picked.inverted(QueryParams::new(), 3, odd);

        let Selection::AllExcept {
            excluded, included, ..
        } = &inverted
        else {
            panic!("inverting an explicit selection yields a complement");
        };
        assert_eq!(excluded, &BTreeSet::from([Value::Int(1)]));
        assert_eq!(included, &BTreeSet::from([Value::Int(2)]));
        assert_eq!(inverted.len(), 3, "two universe members plus the outside id");
        assert_eq!(inverted.inverted(QueryParams::new(), 3, odd), picked);
    }

    #[test]
    fn select_mode_reads_lowercase_names() {
        #[derive(Deserialize)]
        struct Doc {
            mode: SelectMode,
        }

        let doc: Doc = toml::from_str("mode = \"single\"").expect("mode should decode");
        assert_eq!(doc.mode, SelectMode::Single);
    }
}
