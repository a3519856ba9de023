use crate::store::{Cell, RowResult};
use candid::CandidType;
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};

///
/// CellModel
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CellModel {
    #[serde(with = "serde_bytes")]
    pub column: Vec<u8>,

    pub timestamp: u64,

    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
}

impl From<Cell> for CellModel {
    fn from(cell: Cell) -> Self {
        Self {
            column: cell.column,
            timestamp: cell.timestamp,
            value: cell.value,
        }
    }
}

///
/// RowModel
/// One non-empty row of a result set.
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RowModel {
    #[serde(with = "serde_bytes")]
    pub key: Vec<u8>,

    pub cells: Vec<CellModel>,
}

impl From<RowResult> for RowModel {
    fn from(row: RowResult) -> Self {
        Self {
            key: row.key,
            cells: row.cells.into_iter().map(CellModel::from).collect(),
        }
    }
}

///
/// ResultSet
///
/// Non-empty rows in request order; duplicates of a requested key stay.
/// The format-neutral result every boundary encoder works from.
///

#[repr(transparent)]
#[derive(
    CandidType, Clone, Debug, Default, Deref, Deserialize, Eq, IntoIterator, PartialEq, Serialize,
)]
#[into_iterator(owned, ref)]
#[serde(transparent)]
pub struct ResultSet(Vec<RowModel>);

impl ResultSet {
    #[must_use]
    pub const fn from_rows(rows: Vec<RowModel>) -> Self {
        Self(rows)
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<RowModel> {
        self.0
    }

    /// Total cells across every row.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.0.iter().map(|row| row.cells.len()).sum()
    }
}

/// Drop empty per-row results and fold the rest, keeping relative order.
#[must_use]
pub fn assemble(results: Vec<RowResult>) -> ResultSet {
    ResultSet(
        results
            .into_iter()
            .filter(|row| !row.is_empty())
            .map(RowModel::from)
            .collect(),
    )
}

///
/// TESTS
///
