//! Core of KvRest: multi-row reads against a versioned key-value table
//! store. Covers the row key codec, the filter language, fetch planning,
//! batched point reads behind the storage port, and result assembly.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod multiget;
pub mod obs;
pub mod store;

///
/// Prelude
///
/// Request vocabulary and the executor. Errors, codecs and filter internals
/// stay in their modules.
///

pub mod prelude {
    pub use crate::{
        config::{FetchMode, MultiGetConfig},
        multiget::{MultiGetExecutor, MultiGetOutcome, MultiGetRequest, ResultSet},
        store::{MemoryStore, RowStore},
    };
}
