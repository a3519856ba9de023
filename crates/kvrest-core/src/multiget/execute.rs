use crate::{
    config::{FetchMode, MultiGetConfig},
    multiget::{
        FetchRequest, MultiGetError, MultiGetErrorClass, MultiGetOutcome, MultiGetRequest,
        ResultSet, assemble, build_row_specs, fetch_rows,
    },
    obs::{FailureKind, GLOBAL_METRICS_SINK, MetricsSink, RequestSpan},
    store::RowStore,
};
use tracing::{debug, warn};

///
/// MultiGetExecutor
///
/// Runs multi-row reads against one store:
/// params -> filter -> specs -> fetch -> assemble.
///
/// Every invocation records exactly one start event and exactly one
/// outcome event on the configured sink, whatever the outcome.
///

pub struct MultiGetExecutor<'a, S: RowStore + ?Sized> {
    store: &'a S,
    config: MultiGetConfig,
    sink: &'a dyn MetricsSink,
}

impl<'a, S: RowStore + ?Sized> MultiGetExecutor<'a, S> {
    /// Executor reporting into the process-global metrics.
    #[must_use]
    pub fn new(store: &'a S, config: MultiGetConfig) -> Self {
        Self {
            store,
            config,
            sink: &GLOBAL_METRICS_SINK,
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: &'a dyn MetricsSink) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &MultiGetConfig {
        &self.config
    }

    /// Execute an already-parsed request.
    pub fn execute(&self, request: &MultiGetRequest) -> MultiGetOutcome {
        let span = RequestSpan::new(self.sink, &request.table);
        let result = self.run(request);

        Self::conclude(span, &request.table, result)
    }

    /// Parse raw query pairs plus the `Encoding` header, then execute.
    /// Parameter errors are reported like any other failure.
    pub fn execute_query<I, K, V>(
        &self,
        table: &str,
        pairs: I,
        encoding_header: Option<&str>,
    ) -> MultiGetOutcome
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let span = RequestSpan::new(self.sink, table);
        let result = MultiGetRequest::from_query(table, pairs, encoding_header)
            .map_err(MultiGetError::from)
            .and_then(|request| self.run(&request));

        Self::conclude(span, table, result)
    }

    fn run(&self, request: &MultiGetRequest) -> Result<ResultSet, MultiGetError> {
        request.check_key_count(self.config.max_row_keys)?;

        let filter = request
            .filter
            .clone()
            .map(|source| source.parse(self.config.max_filter_bytes))
            .transpose()?;

        let row_specs = build_row_specs(
            &request.row_keys,
            request.key_encoding.as_deref(),
            request.max_versions,
            &request.columns,
        )?;

        if row_specs.is_empty() {
            debug!(table = %request.table, "multi-get with no row keys; storage not consulted");
            return Ok(ResultSet::default());
        }

        let mode = if self.config.fetch_in_parallel(row_specs.len()) {
            FetchMode::Parallel
        } else {
            FetchMode::Sequential
        };
        let fetch = FetchRequest {
            table: request.table.clone(),
            row_specs,
            filter,
            use_cache: request.use_cache,
        };

        debug!(
            table = %fetch.table,
            keys = fetch.row_specs.len(),
            filtered = fetch.filter.is_some(),
            use_cache = fetch.use_cache,
            %mode,
            "multi-get plan built"
        );

        let results = fetch_rows(self.store, &fetch, mode)?;

        Ok(assemble(results))
    }

    fn conclude(
        span: RequestSpan<'_>,
        table: &str,
        result: Result<ResultSet, MultiGetError>,
    ) -> MultiGetOutcome {
        match result {
            Ok(rows) if rows.is_empty() => {
                debug!(table, "multi-get found no rows");
                span.fail(FailureKind::NotFound);
                MultiGetOutcome::NotFound
            }
            Ok(rows) => {
                debug!(table, rows = rows.len(), "multi-get succeeded");
                span.succeed(u64::try_from(rows.len()).unwrap_or(u64::MAX));
                MultiGetOutcome::Success(rows)
            }
            Err(err) => {
                match err.class() {
                    MultiGetErrorClass::Backend => warn!(table, error = %err, "multi-get failed"),
                    MultiGetErrorClass::Input => debug!(table, error = %err, "multi-get rejected"),
                }
                span.fail(err.failure_kind());
                MultiGetOutcome::Error(err)
            }
        }
    }
}
