//! Filter expressions: the textual filter language accepted on multi-row
//! reads, its parsed form, and per-row evaluation used by stores.

mod eval;
mod model;
mod parse;
mod token;

#[cfg(test)]
mod tests;

use crate::codec::decode_base64;
use thiserror::Error as ThisError;

pub use model::{ByteComparator, ColumnRange, CompareOp, Filter, SingleColumnValue};
pub use parse::{MAX_FILTER_DEPTH, parse_filter};

///
/// FilterParseError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum FilterParseError {
    #[error("filter expression is empty")]
    Empty,

    #[error("filter expression exceeds max size: {len} bytes (limit {max})")]
    TooLong { len: usize, max: usize },

    #[error("malformed base64 filter: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedCharacter { offset: usize, found: char },

    #[error("unterminated quoted string starting at offset {offset}")]
    UnterminatedQuote { offset: usize },

    #[error("integer out of range at offset {offset}")]
    InvalidInteger { offset: usize },

    #[error("unbalanced parentheses at offset {offset}")]
    UnbalancedParens { offset: usize },

    #[error("filter nesting exceeds depth {max} at offset {offset}")]
    TooDeep { offset: usize, max: usize },

    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken { offset: usize, found: String },

    #[error("unexpected end of filter expression")]
    UnexpectedEnd,

    #[error("unknown filter '{name}' at offset {offset}")]
    UnknownFilter { name: String, offset: usize },

    #[error("unknown operator '{name}' at offset {offset}")]
    UnknownOperator { name: String, offset: usize },

    #[error("unknown comparator '{name}'")]
    UnknownComparator { name: String },

    #[error("invalid arguments for {filter}: {reason}")]
    InvalidArguments { filter: String, reason: String },

    #[error("invalid regular expression: {reason}")]
    InvalidRegex { reason: String },
}

///
/// FilterSource
///
/// Where the request's filter text came from. When a request carries both
/// forms the base64 one is kept; that choice is made by whoever builds this.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterSource {
    /// Base64 payload (URL-safe or standard alphabet).
    Base64(String),

    /// Raw filter text.
    Text(String),
}

impl FilterSource {
    /// Resolve the source into the filter bytes the parser consumes.
    pub fn into_bytes(self) -> Result<Vec<u8>, FilterParseError> {
        match self {
            Self::Base64(payload) => Ok(decode_base64(&payload)?),
            Self::Text(text) => Ok(text.into_bytes()),
        }
    }

    /// Resolve and parse, enforcing a maximum filter size.
    pub fn parse(self, max_bytes: usize) -> Result<Filter, FilterParseError> {
        let bytes = self.into_bytes()?;
        if bytes.len() > max_bytes {
            return Err(FilterParseError::TooLong {
                len: bytes.len(),
                max: max_bytes,
            });
        }

        parse_filter(&bytes)
    }
}
