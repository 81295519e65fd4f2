use serde::{Deserialize, Serialize};
use std::cell::RefCell;

///
/// EventState
/// Ephemeral, in-memory counters for one thread.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct EventState {
    pub ops: EventOps,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Path expressions
    pub path_evals: u64,
    pub path_eval_failures: u64,
    pub accessor_cache_misses: u64,

    // In-memory query evaluation
    pub filter_runs: u64,
    pub rows_scanned: u64,
    pub rows_matched: u64,
    pub sort_runs: u64,
    pub rows_sorted: u64,

    // Backing service traffic
    pub service_item_fetches: u64,
    pub service_items_requested: u64,
    pub service_items_returned: u64,
    pub service_count_fetches: u64,

    // Page cache
    pub page_cache_hits: u64,
    pub page_cache_misses: u64,
    pub page_cache_invalidations: u64,

    // Selection
    pub selection_changes: u64,
    pub selection_vetoes: u64,
}

///
/// EventReport
/// Point-in-time snapshot handed to embedders and tests.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub counters: EventOps,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Build a report from the current thread's counters.
#[must_use]
pub(crate) fn report() -> EventReport {
    with_state(|m| EventReport {
        counters: m.ops.clone(),
    })
}

/// Saturating `+=` for counter fields.
pub(crate) const fn bump(counter: &mut u64, by: u64) {
    *counter = counter.saturating_add(by);
}
