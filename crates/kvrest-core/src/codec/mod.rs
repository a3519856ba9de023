pub mod hex;


use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

pub use hex::{HexDecodeError, decode_hex};

///
/// Row key codec
///
/// Decodes row-key text into the byte form the storage layer expects.
///
/// Policy lives here:
/// - which encoding names are recognized
/// - row key size limits
///
/// Alphabet details live in `base64` and `hex`.
///

/// Largest row key the storage layer accepts.
pub const MAX_ROW_KEY_BYTES: usize = 32_767;

const PADDING_INDIFFERENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Standard alphabet, padding optional.
pub(crate) const BASE64_STANDARD_LENIENT: GeneralPurpose =
    GeneralPurpose::new(&alphabet::STANDARD, PADDING_INDIFFERENT);

/// URL-safe alphabet, padding optional.
pub(crate) const BASE64_URL_SAFE_LENIENT: GeneralPurpose =
    GeneralPurpose::new(&alphabet::URL_SAFE, PADDING_INDIFFERENT);

///
/// KeyDecodeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum KeyDecodeError {
    #[error("unsupported key encoding: '{name}'")]
    UnsupportedEncoding { name: String },

    #[error("malformed base64 row key: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("malformed hex row key: {0}")]
    Hex(#[from] HexDecodeError),

    #[error("row key is empty")]
    Empty,

    #[error("row key exceeds max size: {len} bytes (limit {max})")]
    TooLong { len: usize, max: usize },
}

///
/// KeyEncoding
///
/// Declared encoding of row-key text.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum KeyEncoding {
    /// Key text is already in final form; its UTF-8 bytes are the key.
    #[default]
    Raw,

    /// Key text is base64 (standard or URL-safe alphabet).
    Base64,

    /// Key text is hexadecimal.
    Hex,
}

impl KeyEncoding {
    /// Resolve an optional encoding hint; an absent hint means `Raw`.
    pub fn from_hint(hint: Option<&str>) -> Result<Self, KeyDecodeError> {
        hint.map_or(Ok(Self::Raw), Self::from_str)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Base64 => "b64",
            Self::Hex => "hex",
        }
    }

    /// Decode one row key under this encoding.
    pub fn decode(self, text: &str) -> Result<Vec<u8>, KeyDecodeError> {
        let bytes = match self {
            Self::Raw => text.as_bytes().to_vec(),
            Self::Base64 => decode_base64(text)?,
            Self::Hex => decode_hex(text)?,
        };

        if bytes.is_empty() {
            return Err(KeyDecodeError::Empty);
        }
        if bytes.len() > MAX_ROW_KEY_BYTES {
            return Err(KeyDecodeError::TooLong {
                len: bytes.len(),
                max: MAX_ROW_KEY_BYTES,
            });
        }

        Ok(bytes)
    }
}

impl FromStr for KeyEncoding {
    type Err = KeyDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();

        match name.to_ascii_lowercase().as_str() {
            "" | "raw" | "none" | "identity" => Ok(Self::Raw),
            "b64" | "base64" => Ok(Self::Base64),
            "hex" => Ok(Self::Hex),
            _ => Err(KeyDecodeError::UnsupportedEncoding {
                name: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for KeyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode one row key according to an optional encoding hint.
pub fn decode_row_key(raw_key: &str, hint: Option<&str>) -> Result<Vec<u8>, KeyDecodeError> {
    KeyEncoding::from_hint(hint)?.decode(raw_key)
}

/// Decode base64 text, picking the alphabet from the characters present.
pub(crate) fn decode_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let text = text.trim();

    if text.contains(['-', '_']) {
        BASE64_URL_SAFE_LENIENT.decode(text)
    } else {
        BASE64_STANDARD_LENIENT.decode(text)
    }
}
