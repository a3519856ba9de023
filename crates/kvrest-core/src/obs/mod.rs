//! Observability: request metrics and the sink abstraction.
//!
//! Structured log events go through `tracing`; this crate never installs a
//! subscriber.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, EventState, TableCounters, TableSummary};
pub use sink::{
    FailureKind, GLOBAL_METRICS_SINK, GlobalMetricsSink, MetricsEvent, MetricsSink, RequestSpan,
    metrics_report, metrics_reset_all,
};
