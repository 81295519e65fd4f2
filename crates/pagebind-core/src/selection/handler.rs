use crate::{
    obs::sink::{self, MetricsEvent},
    query::QueryParams,
    selection::{SelectMode, Selection, SelectionError},
    value::Value,
};
use std::fmt;

///
/// SelectionListener
///
/// Observer of selection changes. `veto` runs before a change is applied;
/// returning `true` rejects it and leaves the selection unchanged.
///

pub trait SelectionListener {
    fn veto(&self, _old: &Selection, _new: &Selection) -> bool {
        false
    }

    fn changed(&self, _old: &Selection, _new: &Selection) {}
}

struct VetoFn<F>(F);

impl<F: Fn(&Selection, &Selection) -> bool> SelectionListener for VetoFn<F> {
    fn veto(&self, old: &Selection, new: &Selection) -> bool {
        (self.0)(old, new)
    }
}

struct ChangedFn<F>(F);

impl<F: Fn(&Selection, &Selection)> SelectionListener for ChangedFn<F> {
    fn changed(&self, old: &Selection, new: &Selection) {
        (self.0)(old, new);
    }
}

///
/// SelectionHandler
///
/// Owns the current selection of one collection. Every mutation returns
/// `Ok(true)` when applied (or already in effect), `Ok(false)` when a
/// listener vetoed it, and an error when the select mode forbids it.
///

pub struct SelectionHandler {
    mode: SelectMode,
    selection: Selection,
    listeners: Vec<Box<dyn SelectionListener>>,
}

impl SelectionHandler {
    #[must_use]
    pub fn new(mode: SelectMode) -> Self {
        Self {
            mode,
            selection: Selection::empty(),
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> SelectMode {
        self.mode
    }

    /// Change the mode; the current selection is cleared without
    /// consulting listeners.
    pub fn set_mode(&mut self, mode: SelectMode) {
        self.mode = mode;
        self.selection = Selection::empty();
    }

    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn add_listener(&mut self, listener: impl SelectionListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn on_veto(&mut self, f: impl Fn(&Selection, &Selection) -> bool + 'static) {
        self.add_listener(VetoFn(f));
    }

    pub fn on_change(&mut self, f: impl Fn(&Selection, &Selection) + 'static) {
        self.add_listener(ChangedFn(f));
    }

    #[must_use]
    pub fn is_selected(&self, id: &Value) -> bool {
        self.selection.contains(id)
    }

    /// Select or deselect `ids`, treating each as a universe member. In
    /// single mode selecting an id replaces the current selection.
    pub fn select_ids(
        &mut self,
        select: bool,
        ids: impl IntoIterator<Item = Value>,
    ) -> Result<bool, SelectionError> {
        self.select_ids_in(select, ids, |_| true)
    }

    /// Like [`Self::select_ids`], with `in_universe` telling which ids
    /// belong to the universe of an "all except" selection.
    pub fn select_ids_in(
        &mut self,
        select: bool,
        ids: impl IntoIterator<Item = Value>,
        in_universe: impl Fn(&Value) -> bool,
    ) -> Result<bool, SelectionError> {
        let ids: Vec<Value> = ids.into_iter().collect();

        let next = match self.mode {
            SelectMode::None => return Err(SelectionError::Disabled),
            SelectMode::Single if select => match ids.as_slice() {
                [] => return Ok(true),
                [id] => Selection::explicit([id.clone()]),
                _ => {
                    return Err(SelectionError::SingleMode {
                        requested: ids.len(),
                    });
                }
            },
            SelectMode::Single | SelectMode::Multi => {
                self.selection.with_members(select, ids, in_universe)
            }
        };

        self.apply(next)
    }

    /// Select every item of `universe`, or clear the selection.
    pub fn select_all(
        &mut self,
        select: bool,
        universe: QueryParams,
        universe_size: usize,
    ) -> Result<bool, SelectionError> {
        self.require_multi("select_all", select)?;

        let next = if select {
            Selection::all(universe, universe_size)
        } else {
            Selection::empty()
        };

        self.apply(next)
    }

    pub fn invert(
        &mut self,
        universe: QueryParams,
        universe_size: usize,
    ) -> Result<bool, SelectionError> {
        self.invert_in(universe, universe_size, |_| true)
    }

    /// Invert within `universe`; `in_universe` tells which explicitly
    /// selected ids belong to it. See [`Selection::inverted`].
    pub fn invert_in(
        &mut self,
        universe: QueryParams,
        universe_size: usize,
        in_universe: impl Fn(&Value) -> bool,
    ) -> Result<bool, SelectionError> {
        self.require_multi("invert", true)?;

        let next = self.selection.inverted(universe, universe_size, in_universe);
        self.apply(next)
    }

    /// Replace the selection wholesale, subject to the mode and listeners.
    pub fn set_selection(&mut self, next: Selection) -> Result<bool, SelectionError> {
        match self.mode {
            SelectMode::None if !next.is_empty() => return Err(SelectionError::Disabled),
            SelectMode::Single if next.is_complement() || next.len() > 1 => {
                return Err(SelectionError::SingleMode {
                    requested: next.len(),
                });
            }
            _ => {}
        }

        self.apply(next)
    }

    // Clearing is legal in every mode except None.
    fn require_multi(&self, operation: &'static str, select: bool) -> Result<(), SelectionError> {
        match self.mode {
            SelectMode::Multi => Ok(()),
            SelectMode::None => Err(SelectionError::Disabled),
            SelectMode::Single if !select => Ok(()),
            SelectMode::Single => Err(SelectionError::MultiOnly { operation }),
        }
    }

    fn apply(&mut self, next: Selection) -> Result<bool, SelectionError> {
        if next == self.selection {
            return Ok(true);
        }

        if self
            .listeners
            .iter()
            .any(|listener| listener.veto(&self.selection, &next))
        {
            sink::record(MetricsEvent::SelectionVetoed);
            return Ok(false);
        }

        let old = std::mem::replace(&mut self.selection, next);
        for listener in &self.listeners {
            listener.changed(&old, &self.selection);
        }
        sink::record(MetricsEvent::SelectionChanged);

        Ok(true)
    }
}

impl Default for SelectionHandler {
    fn default() -> Self {
        Self::new(SelectMode::default())
    }
}

impl fmt::Debug for SelectionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionHandler")
            .field("mode", &self.mode)
            .field("selection", &self.selection)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obs::{metrics_report, metrics_reset_all};
    use std::{cell::RefCell, rc::Rc};

    fn ids(range: std::ops::Range<i64>) -> impl Iterator<Item = Value> {
        range.map(Value::Int)
    }

    #[test]
    fn select_all_then_deselect_one() {
        let mut handler = SelectionHandler::new(SelectMode::Multi);

        assert!(
            handler
                .select_all(true, QueryParams::new(), 100)
                .expect("multi mode should allow select_all")
        );
        assert!(
            handler
                .select_ids(false, [Value::Int(7)])
                .expect("deselect should apply")
        );

        assert!(!handler.is_selected(&Value::Int(7)));
        assert!(handler.is_selected(&Value::Int(8)));
        assert_eq!(handler.selection().len(), 99);
    }

    #[test]
    fn vetoed_change_leaves_state_unchanged() {
        metrics_reset_all();
        let mut handler = SelectionHandler::default();
        handler.on_veto(|_, new| new.contains(&Value::Int(13)));

        assert!(handler.select_ids(true, ids(1..3)).expect("mode allows select"));
        assert!(
            !handler
                .select_ids(true, [Value::Int(13)])
                .expect("veto is not an error")
        );

        assert_eq!(handler.selection(), &Selection::explicit(ids(1..3)));
        let counters = metrics_report().counters;
        assert_eq!(counters.selection_changes, 1);
        assert_eq!(counters.selection_vetoes, 1);
    }

    #[test]
    fn listeners_see_old_and_new_selection() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut handler = SelectionHandler::default();
        let log = Rc::clone(&seen);
        handler.on_change(move |old, new| log.borrow_mut().push((old.len(), new.len())));

        handler.select_ids(true, ids(0..4)).expect("select should apply");
        handler.select_ids(false, ids(0..1)).expect("deselect should apply");
        handler.select_ids(false, ids(0..1)).expect("no-op should succeed");

        assert_eq!(*seen.borrow(), vec![(0, 4), (4, 3)]);
    }

    #[test]
    fn single_mode_rejects_multi_select() {
        let mut handler = SelectionHandler::new(SelectMode::Single);

        handler.select_ids(true, ids(1..2)).expect("one id is fine");
        handler.select_ids(true, ids(2..3)).expect("one id replaces");
        assert_eq!(handler.selection(), &Selection::explicit(ids(2..3)));

        let err = handler
            .select_ids(true, ids(1..3))
            .expect_err("two ids in single mode");
        assert_eq!(err, SelectionError::SingleMode { requested: 2 });

        let err = handler
            .select_all(true, QueryParams::new(), 5)
            .expect_err("select_all needs multi mode");
        assert!(matches!(err, SelectionError::MultiOnly { .. }));

        handler
            .select_all(false, QueryParams::new(), 5)
            .expect("clearing is allowed in single mode");
        assert!(handler.selection().is_empty());
    }

    #[test]
    fn none_mode_disables_selection() {
        let mut handler = SelectionHandler::new(SelectMode::None);

        assert_eq!(
            handler.select_ids(true, ids(1..2)),
            Err(SelectionError::Disabled)
        );
        assert_eq!(
            handler.invert(QueryParams::new(), 3),
            Err(SelectionError::Disabled)
        );
    }

    #[test]
    fn set_selection_honors_the_mode() {
        let mut single = SelectionHandler::new(SelectMode::Single);
        assert_eq!(
            single.set_selection(Selection::explicit(ids(1..3))),
            Err(SelectionError::SingleMode { requested: 2 })
        );
        assert!(matches!(
            single.set_selection(Selection::all(QueryParams::new(), 1)),
            Err(SelectionError::SingleMode { .. })
        ));
        assert!(
            single
                .set_selection(Selection::explicit(ids(4..5)))
                .expect("one id fits single mode")
        );
        assert_eq!(single.selection(), &Selection::explicit(ids(4..5)));

        let mut none = SelectionHandler::new(SelectMode::None);
        assert_eq!(
            none.set_selection(Selection::explicit(ids(1..2))),
            Err(SelectionError::Disabled)
        );
        assert!(
            none.set_selection(Selection::empty())
                .expect("clearing is always allowed")
        );

        let mut multi = SelectionHandler::default();
        multi.on_veto(|_, new| new.is_complement());
        assert!(
            !multi
                .set_selection(Selection::all(QueryParams::new(), 4))
                .expect("veto is not an error")
        );
        assert!(multi.selection().is_empty());
    }

    #[test]
    fn invert_toggles_representation() {
        let mut handler = SelectionHandler::default();
        handler.select_ids(true, ids(0..2)).expect("select should apply");

        handler.invert(QueryParams::new(), 10).expect("invert should apply");
        assert!(handler.selection().is_complement());
        assert_eq!(handler.selection().len(), 8);

        handler.invert(QueryParams::new(), 10).expect("invert should apply");
        assert_eq!(handler.selection(), &Selection::explicit(ids(0..2)));
    }
}
