//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Evaluation, paging and selection code only ever emits `MetricsEvent`s;
//! counters live behind the sink boundary and never influence results.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
