use crate::{
    codec::{KeyDecodeError, KeyEncoding},
    store::{CachePolicy, RowRead},
};
use std::sync::Arc;

///
/// RowKeySpec
///
/// Fetch specification for one requested row key.
///
/// Every spec of one request shares the same column restriction and version
/// cap; only the key and its encoding differ. The restriction is shared by
/// reference count rather than copied per key.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RowKeySpec {
    pub raw_key: String,
    pub encoding: KeyEncoding,
    pub key: Vec<u8>,
    pub max_versions: Option<u32>,
    pub columns: Arc<[Vec<u8>]>,
}

impl RowKeySpec {
    /// The point read this spec describes, without filter or cache policy.
    #[must_use]
    pub fn row_read(&self) -> RowRead<'_> {
        RowRead::new(&self.key)
            .columns(&self.columns)
            .max_versions(self.max_versions)
            .cache(CachePolicy::Use)
    }
}

/// Build one spec per key, preserving order and duplicates.
///
/// The encoding hint is resolved once; an unsupported hint or any key that
/// fails to decode fails the whole build.
pub fn build_row_specs<K>(
    keys: &[K],
    encoding_hint: Option<&str>,
    max_versions: Option<u32>,
    columns: &[String],
) -> Result<Vec<RowKeySpec>, KeyDecodeError>
where
    K: AsRef<str>,
{
    let encoding = KeyEncoding::from_hint(encoding_hint)?;
    let columns: Arc<[Vec<u8>]> = columns
        .iter()
        .map(|column| column.as_bytes().to_vec())
        .collect();

    keys.iter()
        .map(|raw_key| {
            let raw_key = raw_key.as_ref();
            Ok(RowKeySpec {
                raw_key: raw_key.to_string(),
                encoding,
                key: encoding.decode(raw_key)?,
                max_versions,
                columns: Arc::clone(&columns),
            })
        })
        .collect()
}

///
/// TESTS
///
