//! Storage port for point reads plus the in-memory reference store.
//!
//! The multi-get path only ever talks to [`RowStore`]; everything behind it
//! (version storage, caching, filter evaluation) belongs to the store.

mod memory;
mod row;

use crate::{error::InternalError, filter::Filter};

pub use memory::{CacheStats, MemoryStore};
pub use row::{COLUMN_SEPARATOR, Cell, RowResult, column_selected, split_column};

/// Versions returned per column when a read carries no cap.
pub const DEFAULT_MAX_VERSIONS: u32 = 1;

///
/// CachePolicy
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CachePolicy {
    /// Read through the store's row cache.
    #[default]
    Use,

    /// Neither consult nor populate any read-side cache.
    Bypass,
}

impl CachePolicy {
    #[must_use]
    pub const fn from_use_cache(use_cache: bool) -> Self {
        if use_cache { Self::Use } else { Self::Bypass }
    }
}

///
/// RowRead
///
/// One logical point read: a decoded key plus the restrictions applied to
/// it. Everything except the key is shared across a batch.
///

#[derive(Clone, Copy, Debug)]
pub struct RowRead<'a> {
    pub row: &'a [u8],

    /// Column restriction; empty selects every column.
    pub columns: &'a [Vec<u8>],

    /// Version cap per column; `None` means [`DEFAULT_MAX_VERSIONS`].
    pub max_versions: Option<u32>,

    pub filter: Option<&'a Filter>,
    pub cache: CachePolicy,
}

impl<'a> RowRead<'a> {
    #[must_use]
    pub const fn new(row: &'a [u8]) -> Self {
        Self {
            row,
            columns: &[],
            max_versions: None,
            filter: None,
            cache: CachePolicy::Use,
        }
    }

    #[must_use]
    pub const fn columns(mut self, columns: &'a [Vec<u8>]) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub const fn max_versions(mut self, max_versions: Option<u32>) -> Self {
        self.max_versions = max_versions;
        self
    }

    #[must_use]
    pub const fn filter(mut self, filter: Option<&'a Filter>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub const fn cache(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }

    /// Effective per-column version cap.
    #[must_use]
    pub fn version_cap(&self) -> usize {
        let cap = self.max_versions.unwrap_or(DEFAULT_MAX_VERSIONS).max(1);
        usize::try_from(cap).unwrap_or(usize::MAX)
    }
}

///
/// RowStore
///
/// Point-read port into a versioned table store.
///
/// A missing row, or one whose cells are all removed by the restrictions,
/// is an empty [`RowResult`], never an error. A missing table is an error
/// for which [`InternalError::is_table_not_found`] holds.
///

pub trait RowStore: Sync {
    fn read_row(&self, table: &str, read: &RowRead<'_>) -> Result<RowResult, InternalError>;
}

impl<S: RowStore + ?Sized> RowStore for &S {
    fn read_row(&self, table: &str, read: &RowRead<'_>) -> Result<RowResult, InternalError> {
        (**self).read_row(table, read)
    }
}
