use crate::filter::{CompareOp, FilterParseError};

///
/// TokenKind
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(in crate::filter) enum TokenKind {
    LParen,
    RParen,
    Comma,
    Word(String),
    Quoted(Vec<u8>),
    Int(i64),
    Op(CompareOp),
}

impl TokenKind {
    pub(in crate::filter) fn describe(&self) -> String {
        match self {
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::Comma => "','".to_string(),
            Self::Word(word) => format!("'{word}'"),
            Self::Quoted(bytes) => format!("quoted '{}'", String::from_utf8_lossy(bytes)),
            Self::Int(n) => n.to_string(),
            Self::Op(op) => format!("'{op}'"),
        }
    }
}

///
/// Token
/// One lexeme plus its byte offset in the filter text.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(in crate::filter) struct Token {
    pub(in crate::filter) kind: TokenKind,
    pub(in crate::filter) offset: usize,
}

/// Split filter bytes into tokens.
///
/// Quoted strings are single-quoted; a doubled quote inside them is one
/// literal quote. Quoted content is kept as raw bytes.
pub(in crate::filter) fn tokenize(input: &[u8]) -> Result<Vec<Token>, FilterParseError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let byte = input[pos];
        let offset = pos;

        let kind = match byte {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            b'(' => {
                pos += 1;
                TokenKind::LParen
            }
            b')' => {
                pos += 1;
                TokenKind::RParen
            }
            b',' => {
                pos += 1;
                TokenKind::Comma
            }
            b'\'' => {
                let (bytes, next) = lex_quoted(input, pos)?;
                pos = next;
                TokenKind::Quoted(bytes)
            }
            b'<' | b'>' | b'=' | b'!' => {
                let (op, next) = lex_op(input, pos)?;
                pos = next;
                TokenKind::Op(op)
            }
            b'-' | b'0'..=b'9' => {
                let (n, next) = lex_int(input, pos)?;
                pos = next;
                TokenKind::Int(n)
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let end = input[pos..]
                    .iter()
                    .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
                    .map_or(input.len(), |len| pos + len);
                let word = String::from_utf8_lossy(&input[pos..end]).into_owned();
                pos = end;
                TokenKind::Word(word)
            }
            other => {
                return Err(FilterParseError::UnexpectedCharacter {
                    offset,
                    found: char::from(other),
                });
            }
        };

        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

fn lex_quoted(input: &[u8], start: usize) -> Result<(Vec<u8>, usize), FilterParseError> {
    let mut out = Vec::new();
    let mut pos = start + 1;

    while pos < input.len() {
        if input[pos] == b'\'' {
            if input.get(pos + 1) == Some(&b'\'') {
                out.push(b'\'');
                pos += 2;
                continue;
            }
            return Ok((out, pos + 1));
        }
        out.push(input[pos]);
        pos += 1;
    }

    Err(FilterParseError::UnterminatedQuote { offset: start })
}

fn lex_op(input: &[u8], start: usize) -> Result<(CompareOp, usize), FilterParseError> {
    let next = input.get(start + 1).copied();

    let (op, len) = match (input[start], next) {
        (b'<', Some(b'=')) => (CompareOp::Le, 2),
        (b'>', Some(b'=')) => (CompareOp::Ge, 2),
        (b'!', Some(b'=')) => (CompareOp::Ne, 2),
        (b'<', _) => (CompareOp::Lt, 1),
        (b'>', _) => (CompareOp::Gt, 1),
        (b'=', _) => (CompareOp::Eq, 1),
        (other, _) => {
            return Err(FilterParseError::UnexpectedCharacter {
                offset: start,
                found: char::from(other),
            });
        }
    };

    Ok((op, start + len))
}

fn lex_int(input: &[u8], start: usize) -> Result<(i64, usize), FilterParseError> {
    let digits_start = if input[start] == b'-' { start + 1 } else { start };
    let end = input[digits_start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(input.len(), |len| digits_start + len);

    if end == digits_start {
        return Err(FilterParseError::UnexpectedCharacter {
            offset: start,
            found: char::from(input[start]),
        });
    }

    // Slice is ASCII digits with an optional sign, so the only failure is overflow.
    let text = String::from_utf8_lossy(&input[start..end]);
    let n = text
        .parse::<i64>()
        .map_err(|_| FilterParseError::InvalidInteger { offset: start })?;

    Ok((n, end))
}

///
/// TESTS
///
