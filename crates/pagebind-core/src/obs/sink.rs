//! Metrics sink boundary.
//!
//! Core logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics::{self, EventReport, bump};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    PathEval {
        failed: bool,
    },
    FilterRun {
        scanned: u64,
        matched: u64,
    },
    SortRun {
        rows: u64,
    },
    ServiceFetchItems {
        start: u64,
        requested: u64,
        returned: u64,
    },
    ServiceFetchCount,
    PageCacheHit,
    PageCacheMiss,
    PageCacheInvalidated,
    AccessorCacheMiss,
    SelectionChanged,
    SelectionVetoed,
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into the thread-local counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| {
            let ops = &mut m.ops;
            match event {
                MetricsEvent::PathEval { failed } => {
                    bump(&mut ops.path_evals, 1);
                    if failed {
                        bump(&mut ops.path_eval_failures, 1);
                    }
                }
                MetricsEvent::FilterRun { scanned, matched } => {
                    bump(&mut ops.filter_runs, 1);
                    bump(&mut ops.rows_scanned, scanned);
                    bump(&mut ops.rows_matched, matched);
                }
                MetricsEvent::SortRun { rows } => {
                    bump(&mut ops.sort_runs, 1);
                    bump(&mut ops.rows_sorted, rows);
                }
                MetricsEvent::ServiceFetchItems {
                    requested,
                    returned,
                    ..
                } => {
                    bump(&mut ops.service_item_fetches, 1);
                    bump(&mut ops.service_items_requested, requested);
                    bump(&mut ops.service_items_returned, returned);
                }
                MetricsEvent::ServiceFetchCount => bump(&mut ops.service_count_fetches, 1),
                MetricsEvent::PageCacheHit => bump(&mut ops.page_cache_hits, 1),
                MetricsEvent::PageCacheMiss => bump(&mut ops.page_cache_misses, 1),
                MetricsEvent::PageCacheInvalidated => {
                    bump(&mut ops.page_cache_invalidations, 1);
                }
                MetricsEvent::AccessorCacheMiss => bump(&mut ops.accessor_cache_misses, 1),
                MetricsEvent::SelectionChanged => bump(&mut ops.selection_changes, 1),
                MetricsEvent::SelectionVetoed => bump(&mut ops.selection_vetoes, 1),
            }
        });
    }
}

pub(crate) fn record(event: MetricsEvent) {
    // Clone out of the slot so a sink may itself record without re-borrowing.
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());

    match override_sink {
        Some(sink) => sink.record(event),
        None => GlobalMetricsSink.record(event),
    }
}

/// Snapshot the current thread's metrics counters.
#[must_use]
pub fn metrics_report() -> EventReport {
    metrics::report()
}

/// Reset all metrics counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override on this thread.
/// The previous sink is restored on every exit path, including unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::Cell,
        panic::{AssertUnwindSafe, catch_unwind},
    };

    #[derive(Default)]
    struct CountingSink {
        calls: Cell<usize>,
    }

    impl MetricsSink for CountingSink {
        fn record(&self, _: MetricsEvent) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    #[test]
    fn with_metrics_sink_routes_and_restores_nested_overrides() {
        let outer = Rc::new(CountingSink::default());
        let inner = Rc::new(CountingSink::default());

        record(MetricsEvent::PageCacheHit);
        assert_eq!(outer.calls.get(), 0);

        with_metrics_sink(outer.clone(), || {
            record(MetricsEvent::PageCacheMiss);
            assert_eq!(outer.calls.get(), 1);

            with_metrics_sink(inner.clone(), || {
                record(MetricsEvent::SortRun { rows: 3 });
            });

            // Inner override was restored to outer override.
            record(MetricsEvent::ServiceFetchCount);
        });

        assert_eq!(outer.calls.get(), 2);
        assert_eq!(inner.calls.get(), 1);

        SINK_OVERRIDE.with(|cell| {
            assert!(cell.borrow().is_none());
        });
    }

    #[test]
    fn with_metrics_sink_restores_override_on_panic() {
        let sink = Rc::new(CountingSink::default());

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            with_metrics_sink(sink.clone(), || {
                record(MetricsEvent::SelectionChanged);
                panic!("intentional panic for guard test");
            });
        }))
        .is_err();
        assert!(panicked);
        assert_eq!(sink.calls.get(), 1);

        SINK_OVERRIDE.with(|cell| {
            assert!(cell.borrow().is_none());
        });
    }

    #[test]
    fn global_sink_accumulates_counters() {
        metrics_reset_all();

        record(MetricsEvent::FilterRun {
            scanned: 7,
            matched: 2,
        });
        record(MetricsEvent::ServiceFetchItems {
            start: 0,
            requested: 4,
            returned: 3,
        });
        record(MetricsEvent::PathEval { failed: true });

        let counters = metrics_report().counters;
        assert_eq!(counters.filter_runs, 1);
        assert_eq!(counters.rows_scanned, 7);
        assert_eq!(counters.rows_matched, 2);
        assert_eq!(counters.service_item_fetches, 1);
        assert_eq!(counters.service_items_returned, 3);
        assert_eq!(counters.path_eval_failures, 1);
    }

    #[test]
    fn report_serializes_to_json() {
        metrics_reset_all();
        record(MetricsEvent::PageCacheInvalidated);

        let json = serde_json::to_value(metrics_report()).expect("report should serialize");
        assert_eq!(json["counters"]["page_cache_invalidations"], 1);
    }
}
