use crate::filter::FilterSource;
use thiserror::Error as ThisError;

/// Query parameter carrying one row key; may repeat.
pub const PARAM_ROW: &str = "row";
/// Query parameter naming the key encoding when no header is sent.
pub const PARAM_KEY_ENCODING: &str = "e";
/// Comma-separated column restriction.
pub const PARAM_COLUMNS: &str = "c";
/// Per-column version cap.
pub const PARAM_VERSIONS: &str = "v";
/// Raw filter text.
pub const PARAM_FILTER: &str = "filter";
/// Base64 filter text; preferred over [`PARAM_FILTER`].
pub const PARAM_FILTER_B64: &str = "filter_b64";
/// Presence disables read-side caches; the value is ignored.
pub const PARAM_NOCACHE: &str = "nocache";

///
/// ParamError
///
/// Parameters that cannot be interpreted at all.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ParamError {
    #[error("invalid versions parameter '{value}': expected an integer >= 1")]
    InvalidVersions { value: String },

    #[error("too many row keys: {count} (limit {max})")]
    TooManyRowKeys { count: usize, max: usize },
}

///
/// MultiGetRequest
///
/// Request-scoped, immutable description of one multi-row read.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MultiGetRequest {
    pub table: String,

    /// Row keys as sent, in request order; duplicates are kept.
    pub row_keys: Vec<String>,

    /// Key encoding name as sent; `None` reads keys as raw UTF-8.
    pub key_encoding: Option<String>,

    /// Column restriction; empty selects every column.
    pub columns: Vec<String>,

    pub max_versions: Option<u32>,
    pub filter: Option<FilterSource>,
    pub use_cache: bool,
}

impl MultiGetRequest {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            row_keys: Vec::new(),
            key_encoding: None,
            columns: Vec::new(),
            max_versions: None,
            filter: None,
            use_cache: true,
        }
    }

    /// Build a request from decoded query pairs plus the `Encoding` header.
    ///
    /// The header wins over the `e` parameter, `filter_b64` wins over
    /// `filter`, and for single-valued parameters the first occurrence wins.
    pub fn from_query<I, K, V>(
        table: impl Into<String>,
        pairs: I,
        encoding_header: Option<&str>,
    ) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut request = Self::new(table);
        let mut query_encoding = None;
        let mut columns = None;
        let mut versions = None;
        let mut filter_b64 = None;
        let mut filter_text = None;

        for (name, value) in pairs {
            let value = value.as_ref();
            match name.as_ref() {
                PARAM_ROW => request.row_keys.push(value.to_string()),
                PARAM_KEY_ENCODING => {
                    query_encoding.get_or_insert_with(|| value.to_string());
                }
                PARAM_COLUMNS => {
                    columns.get_or_insert_with(|| value.to_string());
                }
                PARAM_VERSIONS => {
                    versions.get_or_insert_with(|| value.to_string());
                }
                PARAM_FILTER_B64 => {
                    filter_b64.get_or_insert_with(|| value.to_string());
                }
                PARAM_FILTER => {
                    filter_text.get_or_insert_with(|| value.to_string());
                }
                PARAM_NOCACHE => request.use_cache = false,
                _ => {}
            }
        }

        request.key_encoding = encoding_header.map(str::to_string).or(query_encoding);
        request.columns = columns.as_deref().map(split_columns).unwrap_or_default();
        request.max_versions = versions.as_deref().map(parse_versions).transpose()?;
        request.filter = filter_b64
            .map(FilterSource::Base64)
            .or_else(|| filter_text.map(FilterSource::Text));

        Ok(request)
    }

    #[must_use]
    pub fn row_key(mut self, key: impl Into<String>) -> Self {
        self.row_keys.push(key.into());
        self
    }

    #[must_use]
    pub fn row_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.row_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn key_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.key_encoding = Some(encoding.into());
        self
    }

    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    #[must_use]
    pub const fn max_versions(mut self, max_versions: u32) -> Self {
        self.max_versions = Some(max_versions);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: FilterSource) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub const fn no_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Enforce the per-request key limit.
    pub const fn check_key_count(&self, max_row_keys: usize) -> Result<(), ParamError> {
        let count = self.row_keys.len();
        if count > max_row_keys {
            return Err(ParamError::TooManyRowKeys {
                count,
                max: max_row_keys,
            });
        }

        Ok(())
    }
}

// Entries are trimmed and empty ones dropped, so a trailing comma is harmless.
fn split_columns(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_versions(text: &str) -> Result<u32, ParamError> {
    match text.trim().parse::<u32>() {
        Ok(versions) if versions >= 1 => Ok(versions),
        _ => Err(ParamError::InvalidVersions {
            value: text.to_string(),
        }),
    }
}

///
/// TESTS
///
