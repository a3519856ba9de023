use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    sync::{LazyLock, Mutex, PoisonError},
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Ephemeral, in-memory counters for multi-row reads.
///

#[derive(CandidType, Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub tables: BTreeMap<String, TableCounters>,
    pub since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            tables: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Entrypoint
    pub requests: u64,

    // Outcomes
    pub succeeded: u64,
    pub failed: u64,
    pub not_found: u64,

    // Failure breakdown
    pub input_errors: u64,
    pub backend_errors: u64,
    pub aborted: u64,

    // Rows returned on success
    pub rows_returned: u64,
}

///
/// TableCounters
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableCounters {
    pub requests: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub rows_returned: u64,
}

static EVENT_STATE: LazyLock<Mutex<EventState>> =
    LazyLock::new(|| Mutex::new(EventState::default()));

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    let state = EVENT_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    f(&state)
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    let mut state = EVENT_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut state)
}

/// Reset all counters and restart the window.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Ephemeral runtime counters since `since_ms`.
    pub counters: Option<EventState>,

    /// Per-table counters, busiest first.
    pub table_counters: Vec<TableSummary>,
}

///
/// TableSummary
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub requests: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub rows_returned: u64,
    pub avg_rows_per_success: f64,
}

/// Build a report from the in-memory counters.
///
/// When `window_start_ms` is later than the state's `since_ms` the counters
/// do not cover the requested window and are omitted.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn report_window_start(window_start_ms: Option<u64>) -> EventReport {
    let snap = with_state(Clone::clone);
    if window_start_ms.is_some_and(|start| start > snap.since_ms) {
        return EventReport::default();
    }

    let mut table_counters: Vec<TableSummary> = snap
        .tables
        .iter()
        .map(|(table, counters)| TableSummary {
            table: table.clone(),
            requests: counters.requests,
            succeeded: counters.succeeded,
            failed: counters.failed,
            rows_returned: counters.rows_returned,
            avg_rows_per_success: if counters.succeeded > 0 {
                counters.rows_returned as f64 / counters.succeeded as f64
            } else {
                0.0
            },
        })
        .collect();

    table_counters.sort_by(|a, b| match b.requests.cmp(&a.requests) {
        Ordering::Equal => a.table.cmp(&b.table),
        other => other,
    });

    EventReport {
        counters: Some(snap),
        table_counters,
    }
}
