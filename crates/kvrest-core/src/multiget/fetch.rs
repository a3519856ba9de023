use crate::{
    config::FetchMode,
    error::InternalError,
    filter::Filter,
    multiget::RowKeySpec,
    store::{CachePolicy, RowResult, RowStore},
};
use rayon::prelude::*;

///
/// FetchRequest
///
/// One batch of point reads against one table. The filter is parsed once
/// and applied identically to every row.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchRequest {
    pub table: String,
    pub row_specs: Vec<RowKeySpec>,
    pub filter: Option<Filter>,
    pub use_cache: bool,
}

impl FetchRequest {
    const fn cache_policy(&self) -> CachePolicy {
        CachePolicy::from_use_cache(self.use_cache)
    }

    fn read_one<S>(&self, store: &S, spec: &RowKeySpec) -> Result<RowResult, InternalError>
    where
        S: RowStore + ?Sized,
    {
        let read = spec
            .row_read()
            .filter(self.filter.as_ref())
            .cache(self.cache_policy());
        let result = store.read_row(&self.table, &read)?;

        if result.key != spec.key {
            return Err(InternalError::fetch_internal(format!(
                "store answered row '{}' for requested row '{}'",
                String::from_utf8_lossy(&result.key),
                spec.raw_key,
            )));
        }

        Ok(result)
    }
}

/// Run every point read of the batch.
///
/// Result `i` answers spec `i` under both strategies. The first failure
/// fails the batch; no partial sequence is ever returned.
pub fn fetch_rows<S>(
    store: &S,
    request: &FetchRequest,
    mode: FetchMode,
) -> Result<Vec<RowResult>, InternalError>
where
    S: RowStore + ?Sized,
{
    match mode {
        FetchMode::Sequential => request
            .row_specs
            .iter()
            .map(|spec| request.read_one(store, spec))
            .collect(),
        FetchMode::Parallel => request
            .row_specs
            .par_iter()
            .map(|spec| request.read_one(store, spec))
            .collect(),
    }
}
