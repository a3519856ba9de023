use regex::bytes::Regex;
use std::{cmp::Ordering, fmt};

///
/// CompareOp
///
/// Comparison applied as `cell OP operand`.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
}

impl CompareOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// True when `ordering` (cell relative to operand) satisfies this op.
    #[must_use]
    pub const fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Lt => matches!(ordering, Ordering::Less),
            Self::Le => !matches!(ordering, Ordering::Greater),
            Self::Eq => matches!(ordering, Ordering::Equal),
            Self::Ne => !matches!(ordering, Ordering::Equal),
            Self::Gt => matches!(ordering, Ordering::Greater),
            Self::Ge => !matches!(ordering, Ordering::Less),
        }
    }

    /// Only equality ops are meaningful for pattern comparators.
    #[must_use]
    pub const fn is_equality(self) -> bool {
        matches!(self, Self::Eq | Self::Ne)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

///
/// ByteComparator
///
/// Right-hand side of a comparison filter, written `kind:operand`.
///

#[derive(Clone, Debug)]
pub enum ByteComparator {
    /// Lexicographic byte comparison.
    Binary(Vec<u8>),

    /// Lexicographic comparison against the cell's leading bytes.
    BinaryPrefix(Vec<u8>),

    /// Case-insensitive containment; operand is stored lowercased.
    Substring(String),

    /// Regular expression match over raw bytes.
    Regex(Regex),
}

impl ByteComparator {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Binary(_) => "binary",
            Self::BinaryPrefix(_) => "binaryprefix",
            Self::Substring(_) => "substring",
            Self::Regex(_) => "regexstring",
        }
    }

    /// Evaluate `value OP operand`.
    #[must_use]
    pub fn matches(&self, op: CompareOp, value: &[u8]) -> bool {
        match self {
            Self::Binary(operand) => op.accepts(value.cmp(operand.as_slice())),
            Self::BinaryPrefix(prefix) => {
                let head = &value[..value.len().min(prefix.len())];
                op.accepts(head.cmp(prefix.as_slice()))
            }
            Self::Substring(needle) => {
                let haystack = String::from_utf8_lossy(value).to_lowercase();
                let found = haystack.contains(needle.as_str());
                if op == CompareOp::Eq { found } else { !found }
            }
            Self::Regex(pattern) => {
                let found = pattern.is_match(value);
                if op == CompareOp::Eq { found } else { !found }
            }
        }
    }
}

impl PartialEq for ByteComparator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Binary(a), Self::Binary(b)) | (Self::BinaryPrefix(a), Self::BinaryPrefix(b)) => {
                a == b
            }
            (Self::Substring(a), Self::Substring(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for ByteComparator {}

///
/// SingleColumnValue
///
/// Row-level test on the value of one named column.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SingleColumnValue {
    pub family: Vec<u8>,
    pub qualifier: Vec<u8>,
    pub op: CompareOp,
    pub comparator: ByteComparator,

    /// Drop the row when the column is absent.
    pub filter_if_missing: bool,

    /// Test only the newest version instead of any version.
    pub latest_version_only: bool,
}

///
/// ColumnRange
///
/// Qualifier range; an absent bound is open.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnRange {
    pub min: Option<Vec<u8>>,
    pub min_inclusive: bool,
    pub max: Option<Vec<u8>>,
    pub max_inclusive: bool,
}

impl ColumnRange {
    #[must_use]
    pub fn contains(&self, qualifier: &[u8]) -> bool {
        let above_min = self.min.as_deref().is_none_or(|min| match qualifier.cmp(min) {
            Ordering::Greater => true,
            Ordering::Equal => self.min_inclusive,
            Ordering::Less => false,
        });
        let below_max = self.max.as_deref().is_none_or(|max| match qualifier.cmp(max) {
            Ordering::Less => true,
            Ordering::Equal => self.max_inclusive,
            Ordering::Greater => false,
        });

        above_min && below_max
    }
}

///
/// Filter
///
/// Parsed filter expression. Built once per request and shared read-only
/// across every row read in the batch.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Filter {
    /// Keep cells but strip their values.
    KeyOnly,

    /// Keep only the first cell of the row.
    FirstKeyOnly,

    /// Keep the row when its key starts with the prefix.
    Prefix(Vec<u8>),

    /// Keep cells whose qualifier starts with the prefix.
    ColumnPrefix(Vec<u8>),

    /// Keep cells whose qualifier starts with any of the prefixes.
    MultipleColumnPrefix(Vec<Vec<u8>>),

    /// Keep cells of the first `n` distinct columns.
    ColumnCountGet(usize),

    /// Keep cells of distinct columns `offset..offset + limit`.
    ColumnPagination { limit: usize, offset: usize },

    /// Keep cells whose timestamp is listed (sorted, deduplicated).
    Timestamps(Vec<u64>),

    /// Keep cells whose qualifier is inside the range.
    ColumnRange(ColumnRange),

    /// Compare the row key.
    Row(CompareOp, ByteComparator),

    /// Compare each cell's family.
    Family(CompareOp, ByteComparator),

    /// Compare each cell's qualifier.
    Qualifier(CompareOp, ByteComparator),

    /// Compare each cell's value.
    Value(CompareOp, ByteComparator),

    /// Compare the value of one named column, keeping or dropping the row.
    SingleColumnValue(SingleColumnValue),

    /// Cells must pass every member.
    And(Vec<Self>),

    /// Cells must pass at least one member.
    Or(Vec<Self>),

    /// Drop the row unless the inner filter keeps every cell.
    Skip(Box<Self>),

    /// Point-read counterpart of scan termination: behaves as `Skip`.
    While(Box<Self>),
}

impl Filter {
    /// True when any node of the tree strips cell values.
    #[must_use]
    pub fn strips_values(&self) -> bool {
        match self {
            Self::KeyOnly => true,
            Self::And(members) | Self::Or(members) => members.iter().any(Self::strips_values),
            Self::Skip(inner) | Self::While(inner) => inner.strips_values(),
            _ => false,
        }
    }
}
