use crate::{
    filter::{Filter, SingleColumnValue},
    store::Cell,
};

///
/// Filter evaluation
///
/// Every filter produces a keep-mask over one row's cells. Row-level filters
/// keep all cells or none; combinators merge masks element-wise.
///

impl Filter {
    /// Apply the filter to one row's cells, returning the survivors in order.
    #[must_use]
    pub fn apply(&self, row: &[u8], cells: Vec<Cell>) -> Vec<Cell> {
        if cells.is_empty() {
            return cells;
        }

        let mask = self.mask(row, &cells);
        let strip_values = self.strips_values();

        cells
            .into_iter()
            .zip(mask)
            .filter(|(_, keep)| *keep)
            .map(|(mut cell, _)| {
                if strip_values {
                    cell.value.clear();
                }
                cell
            })
            .collect()
    }

    /// Per-cell keep decisions, positionally aligned with `cells`.
    pub(crate) fn mask(&self, row: &[u8], cells: &[Cell]) -> Vec<bool> {
        match self {
            Self::KeyOnly => vec![true; cells.len()],
            Self::FirstKeyOnly => (0..cells.len()).map(|idx| idx == 0).collect(),
            Self::Prefix(prefix) => vec![row.starts_with(prefix); cells.len()],
            Self::ColumnPrefix(prefix) => per_cell(cells, |cell| cell.qualifier().starts_with(prefix)),
            Self::MultipleColumnPrefix(prefixes) => per_cell(cells, |cell| {
                prefixes
                    .iter()
                    .any(|prefix| cell.qualifier().starts_with(prefix))
            }),
            Self::ColumnCountGet(limit) => column_ordinals(cells)
                .into_iter()
                .map(|ordinal| ordinal < *limit)
                .collect(),
            Self::ColumnPagination { limit, offset } => column_ordinals(cells)
                .into_iter()
                .map(|ordinal| ordinal >= *offset && ordinal - *offset < *limit)
                .collect(),
            Self::Timestamps(timestamps) => {
                per_cell(cells, |cell| timestamps.binary_search(&cell.timestamp).is_ok())
            }
            Self::ColumnRange(range) => per_cell(cells, |cell| range.contains(cell.qualifier())),
            Self::Row(op, comparator) => vec![comparator.matches(*op, row); cells.len()],
            Self::Family(op, comparator) => {
                per_cell(cells, |cell| comparator.matches(*op, cell.family()))
            }
            Self::Qualifier(op, comparator) => {
                per_cell(cells, |cell| comparator.matches(*op, cell.qualifier()))
            }
            Self::Value(op, comparator) => {
                per_cell(cells, |cell| comparator.matches(*op, &cell.value))
            }
            Self::SingleColumnValue(test) => vec![single_column_admits(test, cells); cells.len()],
            Self::And(members) => combine(members, row, cells, |a, b| a && b),
            Self::Or(members) => combine(members, row, cells, |a, b| a || b),
            Self::Skip(inner) | Self::While(inner) => {
                let whole = inner.mask(row, cells).into_iter().all(|keep| keep);
                vec![whole; cells.len()]
            }
        }
    }
}

fn per_cell(cells: &[Cell], keep: impl Fn(&Cell) -> bool) -> Vec<bool> {
    cells.iter().map(keep).collect()
}

fn combine(
    members: &[Filter],
    row: &[u8],
    cells: &[Cell],
    merge: impl Fn(bool, bool) -> bool,
) -> Vec<bool> {
    members
        .iter()
        .map(|member| member.mask(row, cells))
        .reduce(|acc, next| {
            acc.into_iter()
                .zip(next)
                .map(|(a, b)| merge(a, b))
                .collect()
        })
        .unwrap_or_else(|| vec![true; cells.len()])
}

// Zero-based index of each cell's column among the row's distinct columns.
// Cells of one column are contiguous, so a change of column starts a new one.
fn column_ordinals(cells: &[Cell]) -> Vec<usize> {
    let mut ordinals = Vec::with_capacity(cells.len());
    let mut ordinal = 0;

    for (idx, cell) in cells.iter().enumerate() {
        if idx > 0 && cells[idx - 1].column != cell.column {
            ordinal += 1;
        }
        ordinals.push(ordinal);
    }

    ordinals
}

fn single_column_admits(test: &SingleColumnValue, cells: &[Cell]) -> bool {
    let mut versions = cells
        .iter()
        .filter(|cell| cell.family() == test.family && cell.qualifier() == test.qualifier)
        .peekable();

    if versions.peek().is_none() {
        return !test.filter_if_missing;
    }

    if test.latest_version_only {
        versions
            .next()
            .is_some_and(|cell| test.comparator.matches(test.op, &cell.value))
    } else {
        versions.any(|cell| test.comparator.matches(test.op, &cell.value))
    }
}
