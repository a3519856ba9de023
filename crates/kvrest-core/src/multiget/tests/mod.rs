
use crate::{
    codec::KeyDecodeError,
    config::{FetchMode, MultiGetConfig},
    error::{ErrorOrigin, InternalError},
    filter::{FilterParseError, FilterSource},
    multiget::{
        MultiGetError, MultiGetErrorClass, MultiGetExecutor, MultiGetOutcome, MultiGetRequest,
        ParamError,
    },
    obs::{FailureKind, MetricsEvent, MetricsSink},
    store::{CacheStats, MemoryStore, RowRead, RowResult, RowStore},
};
use std::{
    cell::RefCell,
    sync::atomic::{AtomicUsize, Ordering},
};

///
/// CaptureSink
///

#[derive(Default)]
pub(super) struct CaptureSink {
    events: RefCell<Vec<MetricsEvent>>,
}

impl CaptureSink {
    pub(super) fn into_events(self) -> Vec<MetricsEvent> {
        self.events.into_inner()
    }
}

impl MetricsSink for CaptureSink {
    fn record(&self, event: MetricsEvent) {
        self.events.borrow_mut().push(event);
    }
}

///
/// CountingStore
/// Wraps a store and counts point reads.
///

struct CountingStore<S> {
    inner: S,
    reads: AtomicUsize,
}

impl<S> CountingStore<S> {
    const fn new(inner: S) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl<S: RowStore> RowStore for CountingStore<S> {
    fn read_row(&self, table: &str, read: &RowRead<'_>) -> Result<RowResult, InternalError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_row(table, read)
    }
}

///
/// FailingStore
/// Fails reads of one poisoned key and delegates everything else.
///

struct FailingStore {
    inner: MemoryStore,
    poisoned: Vec<u8>,
}

impl RowStore for FailingStore {
    fn read_row(&self, table: &str, read: &RowRead<'_>) -> Result<RowResult, InternalError> {
        if read.row == self.poisoned.as_slice() {
            return Err(InternalError::store_unavailable("region offline"));
        }

        self.inner.read_row(table, read)
    }
}

///
/// MisroutingStore
/// Answers every read with the row stored under a fixed key.
///

struct MisroutingStore {
    inner: MemoryStore,
    answer: Vec<u8>,
}

impl RowStore for MisroutingStore {
    fn read_row(&self, table: &str, read: &RowRead<'_>) -> Result<RowResult, InternalError> {
        let redirected = RowRead { row: &self.answer, ..*read };
        self.inner.read_row(table, &redirected)
    }
}

pub(super) fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.put("t", "r1", "cf:a", 1, "v1");
    store.put("t", "r3", "cf:a", 5, "old");
    store.put("t", "r3", "cf:a", 9, "new");
    store.put("t", "r3", "cf:b", 2, "b");
    store.put("t", "r3", "meta:x", 3, "x");
    store
}

fn run(store: &dyn RowStore, request: &MultiGetRequest) -> (MultiGetOutcome, Vec<MetricsEvent>) {
    run_with(store, MultiGetConfig::default(), request)
}

fn run_with(
    store: &dyn RowStore,
    config: MultiGetConfig,
    request: &MultiGetRequest,
) -> (MultiGetOutcome, Vec<MetricsEvent>) {
    let sink = CaptureSink::default();
    let outcome = MultiGetExecutor::new(store, config)
        .with_sink(&sink)
        .execute(request);

    (outcome, sink.into_events())
}

fn success(outcome: MultiGetOutcome) -> Vec<(String, Vec<(String, u64, String)>)> {
    let rows = match outcome {
        MultiGetOutcome::Success(rows) => rows,
        other => panic!("expected success, got {other:?}"),
    };

    rows.into_iter()
        .map(|row| {
            let cells = row
                .cells
                .into_iter()
                .map(|cell| {
                    (
                        String::from_utf8_lossy(&cell.column).into_owned(),
                        cell.timestamp,
                        String::from_utf8_lossy(&cell.value).into_owned(),
                    )
                })
                .collect();
            (String::from_utf8_lossy(&row.key).into_owned(), cells)
        })
        .collect()
}

fn error(outcome: MultiGetOutcome) -> MultiGetError {
    match outcome {
        MultiGetOutcome::Error(err) => err,
        other => panic!("expected error, got {other:?}"),
    }
}

fn assert_one_start_one_finish(events: &[MetricsEvent]) {
    assert_eq!(events.len(), 2, "unexpected events: {events:?}");
    assert!(matches!(events[0], MetricsEvent::RequestStart { .. }));
    assert!(matches!(
        events[1],
        MetricsEvent::RequestSucceeded { .. } | MetricsEvent::RequestFailed { .. }
    ));
}

//
// Outcomes
//

#[test]
fn present_and_absent_keys_return_only_present_rows() {
    let store = seeded_store();
    let request = MultiGetRequest::new("t").row_keys(["r1", "r2"]);

    let (outcome, events) = run(&store, &request);

    assert_eq!(
        success(outcome),
        vec![(
            "r1".to_string(),
            vec![("cf:a".to_string(), 1, "v1".to_string())]
        )]
    );
    assert_eq!(
        events[1],
        MetricsEvent::RequestSucceeded {
            table: "t".to_string(),
            rows: 1
        }
    );
}

#[test]
fn only_absent_keys_are_not_found() {
    let store = seeded_store();
    let (outcome, events) = run(&store, &MultiGetRequest::new("t").row_key("r9"));

    assert_eq!(outcome, MultiGetOutcome::NotFound);
    assert_eq!(
        events[1],
        MetricsEvent::RequestFailed {
            table: "t".to_string(),
            kind: FailureKind::NotFound
        }
    );
}

#[test]
fn empty_store_with_valid_keys_is_not_found() {
    let store = MemoryStore::new();
    store.create_table("t");

    let (outcome, _) = run(&store, &MultiGetRequest::new("t").row_keys(["a", "b", "c"]));
    assert!(outcome.is_not_found());
}

#[test]
fn unsupported_encoding_fails_with_invalid_encoding() {
    let store = CountingStore::new(seeded_store());
    let request = MultiGetRequest::new("t")
        .row_key("r1")
        .key_encoding("bad-scheme");

    let (outcome, events) = run(&store, &request);
    let err = error(outcome);

    assert_eq!(
        err,
        MultiGetError::InvalidEncoding(KeyDecodeError::UnsupportedEncoding {
            name: "bad-scheme".to_string()
        })
    );
    assert_eq!(err.class(), MultiGetErrorClass::Input);
    assert_eq!(store.reads(), 0);
    assert_eq!(
        events[1],
        MetricsEvent::RequestFailed {
            table: "t".to_string(),
            kind: FailureKind::InvalidEncoding
        }
    );
}

#[test]
fn duplicate_keys_return_duplicate_rows_in_order() {
    let store = seeded_store();
    let (outcome, _) = run(&store, &MultiGetRequest::new("t").row_keys(["r1", "r3", "r1"]));

    let keys: Vec<String> = success(outcome).into_iter().map(|(key, _)| key).collect();
    assert_eq!(keys, ["r1", "r3", "r1"]);
}

#[test]
fn empty_key_list_is_not_found_without_storage_reads() {
    let store = CountingStore::new(seeded_store());
    let (outcome, events) = run(&store, &MultiGetRequest::new("t"));

    assert_eq!(outcome, MultiGetOutcome::NotFound);
    assert_eq!(store.reads(), 0);
    assert_one_start_one_finish(&events);
}

#[test]
fn encoded_keys_are_decoded_before_fetching() {
    let store = seeded_store();

    let request = MultiGetRequest::new("t")
        .row_keys(["7231", "7233"])
        .key_encoding("hex");
    let keys: Vec<String> = success(run(&store, &request).0)
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    assert_eq!(keys, ["r1", "r3"]);

    let request = MultiGetRequest::new("t").row_key("cjE").key_encoding("b64");
    assert!(run(&store, &request).0.is_success());
}

//
// Restrictions
//

#[test]
fn column_restriction_and_version_cap_apply_to_every_row() {
    let store = seeded_store();
    let request = MultiGetRequest::new("t")
        .row_keys(["r1", "r3"])
        .column("cf")
        .max_versions(2);

    let rows = success(run(&store, &request).0);
    assert_eq!(
        rows,
        vec![
            (
                "r1".to_string(),
                vec![("cf:a".to_string(), 1, "v1".to_string())]
            ),
            (
                "r3".to_string(),
                vec![
                    ("cf:a".to_string(), 9, "new".to_string()),
                    ("cf:a".to_string(), 5, "old".to_string()),
                    ("cf:b".to_string(), 2, "b".to_string()),
                ]
            ),
        ]
    );
}

#[test]
fn filter_applies_identically_to_every_row() {
    let store = seeded_store();
    let request = MultiGetRequest::new("t")
        .row_keys(["r1", "r3"])
        .filter(FilterSource::Text(
            "QualifierFilter(=, 'binary:a') AND KeyOnlyFilter()".to_string(),
        ));

    let rows = success(run(&store, &request).0);
    assert_eq!(
        rows,
        vec![
            ("r1".to_string(), vec![("cf:a".to_string(), 1, String::new())]),
            ("r3".to_string(), vec![("cf:a".to_string(), 9, String::new())]),
        ]
    );
}

#[test]
fn filter_removing_everything_is_not_found() {
    let store = seeded_store();
    let request = MultiGetRequest::new("t")
        .row_keys(["r1", "r3"])
        .filter(FilterSource::Text("PrefixFilter('zzz')".to_string()));

    assert!(run(&store, &request).0.is_not_found());
}

#[test]
fn malformed_filter_fails_before_any_read() {
    let store = CountingStore::new(seeded_store());

    for text in [
        "PrefixFilter('a'",
        "PrefixFilter('a') XOR KeyOnlyFilter()",
        "ValueFilter(=, 'nope:x')",
    ] {
        let request = MultiGetRequest::new("t")
            .row_key("r1")
            .filter(FilterSource::Text(text.to_string()));
        let (outcome, events) = run(&store, &request);

        assert!(
            matches!(error(outcome), MultiGetError::FilterSyntax(_)),
            "{text}"
        );
        assert_one_start_one_finish(&events);
    }

    assert_eq!(store.reads(), 0);
}

#[test]
fn deeply_nested_filter_within_size_limit_is_a_syntax_error() {
    let store = CountingStore::new(seeded_store());
    let text = format!("{}KeyOnlyFilter(){}", "(".repeat(2000), ")".repeat(2000));
    let request = MultiGetRequest::new("t")
        .row_key("r1")
        .filter(FilterSource::Text(text));

    let (outcome, events) = run(&store, &request);

    assert!(matches!(
        error(outcome),
        MultiGetError::FilterSyntax(FilterParseError::TooDeep { .. })
    ));
    assert_eq!(store.reads(), 0);
    assert_one_start_one_finish(&events);
}

#[test]
fn oversized_filter_is_a_syntax_error() {
    let store = seeded_store();
    let config = MultiGetConfig {
        max_filter_bytes: 8,
        ..MultiGetConfig::default()
    };
    let request = MultiGetRequest::new("t")
        .row_key("r1")
        .filter(FilterSource::Text("KeyOnlyFilter()".to_string()));

    let err = error(run_with(&store, config, &request).0);
    assert_eq!(
        err,
        MultiGetError::FilterSyntax(FilterParseError::TooLong { len: 15, max: 8 })
    );
}

//
// Storage failures
//

#[test]
fn one_failing_read_fails_the_whole_batch() {
    let store = FailingStore {
        inner: seeded_store(),
        poisoned: b"r3".to_vec(),
    };
    let request = MultiGetRequest::new("t").row_keys(["r1", "r3"]);

    let (outcome, events) = run(&store, &request);
    let err = error(outcome);

    assert!(matches!(err, MultiGetError::StorageAccess(_)));
    assert_eq!(err.class(), MultiGetErrorClass::Backend);
    assert!(!err.is_table_not_found());
    assert_eq!(
        events[1],
        MetricsEvent::RequestFailed {
            table: "t".to_string(),
            kind: FailureKind::StorageAccess
        }
    );
}

#[test]
fn parallel_batches_also_fail_as_a_whole() {
    let store = FailingStore {
        inner: seeded_store(),
        poisoned: b"r3".to_vec(),
    };
    let config = MultiGetConfig {
        parallel_min_keys: 1,
        ..MultiGetConfig::default()
    }
    .with_fetch_mode(FetchMode::Parallel);
    let request = MultiGetRequest::new("t").row_keys(["r1", "r1", "r3", "r1"]);

    let err = error(run_with(&store, config, &request).0);
    assert!(matches!(err, MultiGetError::StorageAccess(_)));
}

#[test]
fn missing_table_is_a_storage_error_flagged_as_not_found_table() {
    let store = seeded_store();
    let (outcome, _) = run(&store, &MultiGetRequest::new("ghost").row_key("r1"));
    let err = error(outcome);

    assert!(err.is_table_not_found());
    assert_eq!(err.failure_kind(), FailureKind::StorageAccess);
}

#[test]
fn a_result_for_the_wrong_row_fails_the_batch() {
    let store = MisroutingStore {
        inner: seeded_store(),
        answer: b"r3".to_vec(),
    };
    let (outcome, _) = run(&store, &MultiGetRequest::new("t").row_keys(["r3", "r1"]));

    match error(outcome) {
        MultiGetError::StorageAccess(err) => assert_eq!(err.origin, ErrorOrigin::Fetch),
        other => panic!("expected storage access failure, got {other:?}"),
    }
}

//
// Strategy and cache
//

#[test]
fn parallel_and_sequential_fetches_agree() {
    let store = seeded_store();
    let request = MultiGetRequest::new("t")
        .row_keys(["r3", "r9", "r1", "r3", "r2", "r1"])
        .max_versions(3);

    let sequential = run(&store, &request).0;
    let parallel_config = MultiGetConfig {
        parallel_min_keys: 2,
        ..MultiGetConfig::default()
    }
    .with_fetch_mode(FetchMode::Parallel);
    let parallel = run_with(&store, parallel_config, &request).0;

    assert!(sequential.is_success());
    assert_eq!(sequential, parallel);
}

#[test]
fn nocache_requests_never_touch_the_row_cache() {
    let store = seeded_store();
    let request = MultiGetRequest::new("t").row_keys(["r1", "r3"]).no_cache();

    let first = run(&store, &request).0;
    let second = run(&store, &request).0;

    assert_eq!(first, second);
    assert_eq!(store.cached_rows(), 0);
    assert_eq!(
        store.cache_stats(),
        CacheStats {
            hits: 0,
            misses: 0,
            bypasses: 4
        }
    );
}

#[test]
fn cached_requests_are_served_from_the_row_cache_on_repeat() {
    let store = seeded_store();
    let request = MultiGetRequest::new("t").row_keys(["r1", "r3"]);

    let first = run(&store, &request).0;
    let second = run(&store, &request).0;

    assert_eq!(first, second);
    assert_eq!(store.cached_rows(), 2);
    assert_eq!(store.cache_stats().hits, 2);
}

//
// Parameters
//

#[test]
fn query_pairs_drive_the_whole_request() {
    let store = seeded_store();
    let sink = CaptureSink::default();
    let executor = MultiGetExecutor::new(&store, MultiGetConfig::default()).with_sink(&sink);

    // "QualifierFilter(=, 'binary:b')" in base64.
    let outcome = executor.execute_query(
        "t",
        [
            ("row", "7233"),
            ("e", "b64"),
            ("c", "cf,"),
            ("v", "1"),
            ("filter", "KeyOnlyFilter()"),
            ("filter_b64", "UXVhbGlmaWVyRmlsdGVyKD0sICdiaW5hcnk6Yicp"),
            ("nocache", ""),
        ],
        Some("hex"),
    );

    assert_eq!(
        success(outcome),
        vec![("r3".to_string(), vec![("cf:b".to_string(), 2, "b".to_string())])]
    );
    assert_eq!(store.cached_rows(), 0);
    assert_one_start_one_finish(&sink.into_events());
}

#[test]
fn unreadable_parameters_are_reported_and_counted() {
    let store = seeded_store();
    let sink = CaptureSink::default();
    let executor = MultiGetExecutor::new(&store, MultiGetConfig::default()).with_sink(&sink);

    let outcome = executor.execute_query("t", [("row", "r1"), ("v", "zero")], None);
    assert_eq!(
        error(outcome),
        MultiGetError::InvalidParameter(ParamError::InvalidVersions {
            value: "zero".to_string()
        })
    );

    let events = sink.into_events();
    assert_one_start_one_finish(&events);
    assert_eq!(
        events[1],
        MetricsEvent::RequestFailed {
            table: "t".to_string(),
            kind: FailureKind::InvalidParameter
        }
    );
}

#[test]
fn too_many_keys_are_rejected_before_decoding() {
    let store = CountingStore::new(seeded_store());
    let config = MultiGetConfig {
        max_row_keys: 2,
        ..MultiGetConfig::default()
    };
    let request = MultiGetRequest::new("t").row_keys(["r1", "r2", "r3"]);

    let err = error(run_with(&store, config, &request).0);
    assert_eq!(
        err,
        MultiGetError::InvalidParameter(ParamError::TooManyRowKeys { count: 3, max: 2 })
    );
    assert_eq!(store.reads(), 0);
}

//
// Metrics
//

#[test]
fn every_outcome_records_exactly_one_start_and_one_finish() {
    let store = seeded_store();
    let requests = [
        MultiGetRequest::new("t").row_key("r1"),
        MultiGetRequest::new("t").row_key("r9"),
        MultiGetRequest::new("t").row_key("r1").key_encoding("rot13"),
        MultiGetRequest::new("t")
            .row_key("r1")
            .filter(FilterSource::Text("(".to_string())),
        MultiGetRequest::new("ghost").row_key("r1"),
        MultiGetRequest::new("t"),
    ];

    for request in &requests {
        let (_, events) = run(&store, request);
        assert_one_start_one_finish(&events);
        assert_eq!(
            events[0],
            MetricsEvent::RequestStart {
                table: request.table.clone()
            }
        );
    }
}

#[test]
fn repeated_requests_are_idempotent() {
    let store = seeded_store();
    let request = MultiGetRequest::new("t")
        .row_keys(["r3", "r1", "r9"])
        .column("cf:a")
        .max_versions(5);

    let first = run(&store, &request).0;
    for _ in 0..3 {
        assert_eq!(run(&store, &request).0, first);
    }
}
