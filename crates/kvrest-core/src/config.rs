use serde::{Deserialize, Serialize};
use std::{fmt, fs, io, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

///
/// FetchMode
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// One point read after another on the calling thread.
    #[default]
    Sequential,

    /// Point reads spread over the rayon pool.
    Parallel,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        };
        write!(f, "{label}")
    }
}

///
/// MultiGetConfig
///
/// Limits and execution strategy for multi-row reads.
///
/// ```toml
/// max_row_keys = 1024
/// max_filter_bytes = 16384
/// fetch_mode = "parallel"
/// parallel_min_keys = 8
/// ```
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MultiGetConfig {
    /// Most row keys one request may name.
    pub max_row_keys: usize,

    /// Largest accepted filter expression, after base64 decoding.
    pub max_filter_bytes: usize,

    pub fetch_mode: FetchMode,

    /// Smallest batch that is fetched in parallel when `fetch_mode` allows it.
    pub parallel_min_keys: usize,
}

impl MultiGetConfig {
    pub const DEFAULT_MAX_ROW_KEYS: usize = 1024;
    pub const DEFAULT_MAX_FILTER_BYTES: usize = 16 * 1024;
    pub const DEFAULT_PARALLEL_MIN_KEYS: usize = 8;

    /// Parse and validate a TOML document. Missing fields take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_row_keys == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_row_keys",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_filter_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_filter_bytes",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    #[must_use]
    pub const fn with_fetch_mode(mut self, fetch_mode: FetchMode) -> Self {
        self.fetch_mode = fetch_mode;
        self
    }

    /// Whether a batch of `keys` specs should be fetched in parallel.
    #[must_use]
    pub const fn fetch_in_parallel(&self, keys: usize) -> bool {
        matches!(self.fetch_mode, FetchMode::Parallel) && keys >= self.parallel_min_keys
    }
}

impl Default for MultiGetConfig {
    fn default() -> Self {
        Self {
            max_row_keys: Self::DEFAULT_MAX_ROW_KEYS,
            max_filter_bytes: Self::DEFAULT_MAX_FILTER_BYTES,
            fetch_mode: FetchMode::Sequential,
            parallel_min_keys: Self::DEFAULT_PARALLEL_MIN_KEYS,
        }
    }
}

///
/// TESTS
///
