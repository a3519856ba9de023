use crate::{
    encode::{Encoder, MIME_TEXT},
    error::Error,
};
use kvrest_core::multiget::MultiGetOutcome;

pub const STATUS_OK: u16 = 200;
pub const STATUS_NOT_FOUND: u16 = 404;

/// Body of the 404 sent when a batch yields no non-empty row.
pub const NOT_FOUND_BODY: &str = "No rows found.\r\n";

///
/// Reply
///
/// Transport-neutral HTTP response: status, media type and body bytes.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            status: STATUS_NOT_FOUND,
            content_type: MIME_TEXT,
            body: NOT_FOUND_BODY.as_bytes().to_vec(),
        }
    }

    /// Plain-text error reply; the status comes from the error kind.
    #[must_use]
    pub fn error(err: &Error) -> Self {
        Self {
            status: err.status(),
            content_type: MIME_TEXT,
            body: format!("{}\r\n", err.message).into_bytes(),
        }
    }

    /// Map a multi-get outcome onto a reply, encoding rows with `encoder`.
    ///
    /// The read's metrics are already recorded by the time this runs, so an
    /// encode failure is a 500 reply over a read counted as succeeded.
    #[must_use]
    pub fn from_outcome(outcome: MultiGetOutcome, encoder: &dyn Encoder) -> Self {
        match outcome {
            MultiGetOutcome::Success(rows) => match encoder.encode(&rows) {
                Ok(body) => Self {
                    status: STATUS_OK,
                    content_type: encoder.content_type(),
                    body,
                },
                Err(err) => Self::error(&err),
            },
            MultiGetOutcome::NotFound => Self::not_found(),
            MultiGetOutcome::Error(err) => Self::error(&err.into()),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

///
/// TESTS
///
