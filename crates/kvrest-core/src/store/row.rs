/// Separator between family and qualifier in a column name.
pub const COLUMN_SEPARATOR: u8 = b':';

///
/// Cell
///
/// One versioned value of one column.
/// Columns are written `family:qualifier`.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Cell {
    pub column: Vec<u8>,
    pub timestamp: u64,
    pub value: Vec<u8>,
}

impl Cell {
    #[must_use]
    pub fn new(column: impl Into<Vec<u8>>, timestamp: u64, value: impl Into<Vec<u8>>) -> Self {
        Self {
            column: column.into(),
            timestamp,
            value: value.into(),
        }
    }

    /// Family part of the column (the whole column when it has no separator).
    #[must_use]
    pub fn family(&self) -> &[u8] {
        split_column(&self.column).0
    }

    /// Qualifier part of the column (empty when it has no separator).
    #[must_use]
    pub fn qualifier(&self) -> &[u8] {
        split_column(&self.column).1
    }
}

/// Split a column name at its first separator.
#[must_use]
pub fn split_column(column: &[u8]) -> (&[u8], &[u8]) {
    match column.iter().position(|b| *b == COLUMN_SEPARATOR) {
        Some(idx) => (&column[..idx], &column[idx + 1..]),
        None => (column, &column[column.len()..]),
    }
}

/// True when `column` is selected by `restriction`.
///
/// A restriction without a separator selects its whole family; one with a
/// separator selects exactly that column.
#[must_use]
pub fn column_selected(restriction: &[u8], column: &[u8]) -> bool {
    if restriction.contains(&COLUMN_SEPARATOR) {
        restriction == column
    } else {
        split_column(column).0 == restriction
    }
}

///
/// RowResult
///
/// Outcome of one point read: the requested key plus its surviving cells,
/// ordered by column ascending then timestamp descending. No cells means the
/// row was absent or filtered out entirely.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RowResult {
    pub key: Vec<u8>,
    pub cells: Vec<Cell>,
}

impl RowResult {
    #[must_use]
    pub const fn new(key: Vec<u8>, cells: Vec<Cell>) -> Self {
        Self { key, cells }
    }

    #[must_use]
    pub const fn empty(key: Vec<u8>) -> Self {
        Self {
            key,
            cells: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.cells.len()
    }
}

///
/// TESTS
///
