//! Metrics sink boundary.
//!
//! Request handling MUST NOT touch obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics;
use std::fmt;

///
/// FailureKind
/// Why a request was reported as failed. Not-found counts as a failure.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FailureKind {
    NotFound,
    InvalidParameter,
    InvalidEncoding,
    FilterSyntax,
    StorageAccess,

    /// The request span was dropped without an outcome (unwind).
    Aborted,
}

impl FailureKind {
    #[must_use]
    pub const fn is_input_error(self) -> bool {
        matches!(
            self,
            Self::InvalidParameter | Self::InvalidEncoding | Self::FilterSyntax
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::InvalidParameter => "invalid_parameter",
            Self::InvalidEncoding => "invalid_encoding",
            Self::FilterSyntax => "filter_syntax",
            Self::StorageAccess => "storage_access",
            Self::Aborted => "aborted",
        };
        write!(f, "{label}")
    }
}

///
/// MetricsEvent
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    RequestStart { table: String },
    RequestSucceeded { table: String, rows: u64 },
    RequestFailed { table: String, kind: FailureKind },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into the process-global metrics state.

pub struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::RequestStart { table } => {
                metrics::with_state_mut(|m| {
                    m.ops.requests = m.ops.requests.saturating_add(1);
                    let entry = m.tables.entry(table).or_default();
                    entry.requests = entry.requests.saturating_add(1);
                });
            }

            MetricsEvent::RequestSucceeded { table, rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.succeeded = m.ops.succeeded.saturating_add(1);
                    m.ops.rows_returned = m.ops.rows_returned.saturating_add(rows);
                    let entry = m.tables.entry(table).or_default();
                    entry.succeeded = entry.succeeded.saturating_add(1);
                    entry.rows_returned = entry.rows_returned.saturating_add(rows);
                });
            }

            MetricsEvent::RequestFailed { table, kind } => {
                metrics::with_state_mut(|m| {
                    m.ops.failed = m.ops.failed.saturating_add(1);
                    match kind {
                        FailureKind::NotFound => {
                            m.ops.not_found = m.ops.not_found.saturating_add(1);
                        }
                        FailureKind::StorageAccess => {
                            m.ops.backend_errors = m.ops.backend_errors.saturating_add(1);
                        }
                        FailureKind::Aborted => m.ops.aborted = m.ops.aborted.saturating_add(1),
                        FailureKind::InvalidParameter
                        | FailureKind::InvalidEncoding
                        | FailureKind::FilterSyntax => {
                            m.ops.input_errors = m.ops.input_errors.saturating_add(1);
                        }
                    }

                    let entry = m.tables.entry(table).or_default();
                    entry.failed = entry.failed.saturating_add(1);
                });
            }
        }
    }
}

pub const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

/// Snapshot the current metrics state.
///
/// `window_start_ms` filters by window start (`EventState::since_ms`),
/// not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<u64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

///
/// RequestSpan
/// RAII guard that emits the start event on creation and exactly one
/// outcome event, even on unwind.
///

pub struct RequestSpan<'a> {
    sink: &'a dyn MetricsSink,
    table: String,
    finished: bool,
}

impl<'a> RequestSpan<'a> {
    /// Start a span for one request against `table`.
    #[must_use]
    pub fn new(sink: &'a dyn MetricsSink, table: &str) -> Self {
        sink.record(MetricsEvent::RequestStart {
            table: table.to_string(),
        });

        Self {
            sink,
            table: table.to_string(),
            finished: false,
        }
    }

    /// Close the span as a success returning `rows` rows.
    pub fn succeed(mut self, rows: u64) {
        self.finish(MetricsEvent::RequestSucceeded {
            table: self.table.clone(),
            rows,
        });
    }

    /// Close the span as a failure.
    pub fn fail(mut self, kind: FailureKind) {
        self.finish(MetricsEvent::RequestFailed {
            table: self.table.clone(),
            kind,
        });
    }

    fn finish(&mut self, event: MetricsEvent) {
        if !self.finished {
            self.finished = true;
            self.sink.record(event);
        }
    }
}

impl Drop for RequestSpan<'_> {
    fn drop(&mut self) {
        let table = std::mem::take(&mut self.table);
        self.finish(MetricsEvent::RequestFailed {
            table,
            kind: FailureKind::Aborted,
        });
    }
}

///
/// TESTS
///
