use thiserror::Error as ThisError;

///
/// HexDecodeError
///
/// Offsets are 0-based byte positions into the key text.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum HexDecodeError {
    #[error("hex key has odd length {len}")]
    OddLength { len: usize },

    #[error("invalid hex digit '{found}' at offset {offset}")]
    InvalidDigit { offset: usize, found: char },
}

/// Decode a hex row key; either letter case is accepted.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, HexDecodeError> {
    let digits = text.as_bytes();
    if digits.len() % 2 != 0 {
        return Err(HexDecodeError::OddLength { len: digits.len() });
    }

    digits
        .chunks_exact(2)
        .enumerate()
        .map(|(pair, chunk)| {
            let offset = pair * 2;
            let high = digit_value(text, chunk[0], offset)?;
            let low = digit_value(text, chunk[1], offset + 1)?;

            Ok((high << 4) | low)
        })
        .collect()
}

// Every byte before `offset` is an ASCII digit, so `offset` is a char boundary.
fn digit_value(text: &str, digit: u8, offset: usize) -> Result<u8, HexDecodeError> {
    let value = match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => {
            let found = text
                .get(offset..)
                .and_then(|rest| rest.chars().next())
                .unwrap_or(char::REPLACEMENT_CHARACTER);

            return Err(HexDecodeError::InvalidDigit { offset, found });
        }
    };

    Ok(value)
}

///
/// TESTS
///
