//! ## Crate layout
//! - `core`: multi-row read engine, filter language, storage port and metrics.
//! - `encode`: response body encoders and `Accept` negotiation.
//! - `error`: public error taxonomy with HTTP status mapping.
//! - `reply`: transport-neutral HTTP replies.
//!
//! [`multi_get`] is the REST entry point: it negotiates the body encoding,
//! runs the read, and maps the outcome onto a [`Reply`].

pub use kvrest_core as core;

pub mod encode;
pub mod error;
pub mod reply;

pub use error::Error;
pub use reply::Reply;

use kvrest_core::{multiget::MultiGetExecutor, store::RowStore};
use tracing::debug;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// RequestHeaders
///
/// The request headers the multi-row resource reads.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct RequestHeaders<'a> {
    /// `Encoding` header; overrides the `e` query parameter.
    pub encoding: Option<&'a str>,

    /// `Accept` header; selects the body encoder.
    pub accept: Option<&'a str>,
}

/// Serve one `GET /{table}/multiget` request.
///
/// `query` holds the decoded query pairs in request order. An unsupported
/// `Accept` value is refused with 406 before the read runs.
pub fn multi_get<S, I, K, V>(
    executor: &MultiGetExecutor<'_, S>,
    table: &str,
    query: I,
    headers: RequestHeaders<'_>,
) -> Reply
where
    S: RowStore + ?Sized,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let encoder = match encode::encoder_for_accept(headers.accept) {
        Ok(encoder) => encoder,
        Err(err) => {
            debug!(table, error = %err, "multi-get refused");
            return Reply::error(&err);
        }
    };

    let outcome = executor.execute_query(table, query, headers.encoding);

    Reply::from_outcome(outcome, encoder)
}

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        RequestHeaders, Reply,
        core::prelude::*,
        encode::{Encoder, encoder_for_accept},
        error::Error,
        multi_get,
    };
}
