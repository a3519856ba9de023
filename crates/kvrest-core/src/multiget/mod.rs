//! Multi-row read: request parameters, fetch plan construction, batched
//! point reads, and result assembly.

mod assemble;
mod execute;
mod fetch;
mod params;
mod spec;

#[cfg(test)]
mod tests;

use crate::{
    codec::KeyDecodeError, error::InternalError, filter::FilterParseError, obs::FailureKind,
};
use thiserror::Error as ThisError;

pub use assemble::{CellModel, ResultSet, RowModel, assemble};
pub use execute::MultiGetExecutor;
pub use fetch::{FetchRequest, fetch_rows};
pub use params::{
    MultiGetRequest, PARAM_COLUMNS, PARAM_FILTER, PARAM_FILTER_B64, PARAM_KEY_ENCODING,
    PARAM_NOCACHE, PARAM_ROW, PARAM_VERSIONS, ParamError,
};
pub use spec::{RowKeySpec, build_row_specs};

///
/// MultiGetError
///
/// Terminal error of one multi-row read. Component errors pass through
/// unchanged.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MultiGetError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParamError),

    #[error("invalid row key encoding: {0}")]
    InvalidEncoding(#[from] KeyDecodeError),

    #[error("filter syntax error: {0}")]
    FilterSyntax(#[from] FilterParseError),

    #[error("storage access failed: {0}")]
    StorageAccess(#[from] InternalError),
}

impl MultiGetError {
    #[must_use]
    pub const fn class(&self) -> MultiGetErrorClass {
        match self {
            Self::InvalidParameter(_) | Self::InvalidEncoding(_) | Self::FilterSyntax(_) => {
                MultiGetErrorClass::Input
            }
            Self::StorageAccess(_) => MultiGetErrorClass::Backend,
        }
    }

    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::InvalidParameter(_) => FailureKind::InvalidParameter,
            Self::InvalidEncoding(_) => FailureKind::InvalidEncoding,
            Self::FilterSyntax(_) => FailureKind::FilterSyntax,
            Self::StorageAccess(_) => FailureKind::StorageAccess,
        }
    }

    /// True when storage reported that the table does not exist.
    #[must_use]
    pub const fn is_table_not_found(&self) -> bool {
        match self {
            Self::StorageAccess(err) => err.is_table_not_found(),
            _ => false,
        }
    }
}

///
/// MultiGetErrorClass
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MultiGetErrorClass {
    /// The request itself is malformed; retrying it unchanged cannot help.
    Input,

    /// The storage layer failed.
    Backend,
}

///
/// MultiGetOutcome
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MultiGetOutcome {
    Success(ResultSet),

    /// The batch produced no non-empty row.
    NotFound,

    Error(MultiGetError),
}

impl MultiGetOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    #[must_use]
    pub const fn rows(&self) -> Option<&ResultSet> {
        match self {
            Self::Success(rows) => Some(rows),
            _ => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&MultiGetError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}
