use crate::{
    error::InternalError,
    store::{CachePolicy, Cell, RowRead, RowResult, RowStore, column_selected},
};
use std::{
    cmp::Reverse,
    collections::{BTreeMap, HashMap},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

// column -> versions keyed newest first
type StoredRow = BTreeMap<Vec<u8>, BTreeMap<Reverse<u64>, Vec<u8>>>;
type Table = BTreeMap<Vec<u8>, Arc<StoredRow>>;
type RowCache = HashMap<(String, Vec<u8>), Arc<StoredRow>>;

///
/// MemoryStore
///
/// In-memory versioned table store with a read-side row cache.
///
/// Rows are held as immutable snapshots; a write replaces the snapshot and
/// evicts the cached copy. A snapshot loaded on a cache miss is cached only
/// if no write landed between the load and the insert, so cached reads never
/// observe stale data.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, Table>>,
    cache: Mutex<RowCache>,
    stats: CacheCounters,

    /// Bumped by every write while the table lock is held.
    generation: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table. Existing tables are left untouched.
    pub fn create_table(&self, table: &str) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(table.to_string())
            .or_default();
    }

    /// Write one cell version, creating the table on first use.
    /// Writing an existing (column, timestamp) pair replaces its value.
    pub fn put(
        &self,
        table: &str,
        row: impl Into<Vec<u8>>,
        column: impl Into<Vec<u8>>,
        timestamp: u64,
        value: impl Into<Vec<u8>>,
    ) {
        let row = row.into();

        {
            let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
            let stored = tables
                .entry(table.to_string())
                .or_default()
                .entry(row.clone())
                .or_default();

            Arc::make_mut(stored)
                .entry(column.into())
                .or_default()
                .insert(Reverse(timestamp), value.into());

            self.generation.fetch_add(1, Ordering::SeqCst);
        }

        self.lock_cache().remove(&(table.to_string(), row));
    }

    /// Number of rows currently held in the row cache.
    #[must_use]
    pub fn cached_rows(&self) -> usize {
        self.lock_cache().len()
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    fn lock_cache(&self) -> MutexGuard<'_, RowCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Look the row up in the table map, distinguishing a missing table.
    // Also returns the write generation the snapshot belongs to.
    fn load_row(
        &self,
        table: &str,
        row: &[u8],
    ) -> Result<(Option<Arc<StoredRow>>, u64), InternalError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let generation = self.generation.load(Ordering::SeqCst);
        let rows = tables
            .get(table)
            .ok_or_else(|| InternalError::table_not_found(table))?;

        Ok((rows.get(row).cloned(), generation))
    }

    // A write bumps the generation before it evicts, and eviction waits for
    // the cache lock, so a snapshot accepted here is either current or gets
    // evicted by the write that outdated it.
    fn fill_cache(&self, key: (String, Vec<u8>), stored: &Arc<StoredRow>, generation: u64) {
        let mut cache = self.lock_cache();
        if self.generation.load(Ordering::SeqCst) == generation {
            cache.insert(key, Arc::clone(stored));
        }
    }

    fn fetch_stored(
        &self,
        table: &str,
        row: &[u8],
        cache: CachePolicy,
    ) -> Result<Option<Arc<StoredRow>>, InternalError> {
        if cache == CachePolicy::Bypass {
            self.stats.bypasses.fetch_add(1, Ordering::Relaxed);
            return self.load_row(table, row).map(|(stored, _)| stored);
        }

        let key = (table.to_string(), row.to_vec());
        if let Some(hit) = self.lock_cache().get(&key).cloned() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(hit));
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let (stored, generation) = self.load_row(table, row)?;
        if let Some(stored) = &stored {
            self.fill_cache(key, stored, generation);
        }

        Ok(stored)
    }
}

impl RowStore for MemoryStore {
    fn read_row(&self, table: &str, read: &RowRead<'_>) -> Result<RowResult, InternalError> {
        let Some(stored) = self.fetch_stored(table, read.row, read.cache)? else {
            return Ok(RowResult::empty(read.row.to_vec()));
        };

        let cap = read.version_cap();
        let cells: Vec<Cell> = stored
            .iter()
            .filter(|(column, _)| {
                read.columns.is_empty()
                    || read
                        .columns
                        .iter()
                        .any(|restriction| column_selected(restriction, column))
            })
            .flat_map(|(column, versions)| {
                versions.iter().take(cap).map(move |(Reverse(ts), value)| {
                    Cell::new(column.clone(), *ts, value.clone())
                })
            })
            .collect();

        let cells = match read.filter {
            Some(filter) => filter.apply(read.row, cells),
            None => cells,
        };

        Ok(RowResult::new(read.row.to_vec(), cells))
    }
}

///
/// CacheStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub bypasses: u64,
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    bypasses: AtomicU64,
}

impl CacheCounters {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            bypasses: self.bypasses.load(Ordering::Relaxed),
        }
    }
}

///
/// TESTS
///
