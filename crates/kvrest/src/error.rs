use candid::CandidType;
use derive_more::Display;
use kvrest_core::{
    error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError},
    multiget::MultiGetError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    pub(crate) fn not_acceptable(accept: &str) -> Self {
        Self::new(
            ErrorKind::Response(ResponseErrorKind::NotAcceptable),
            ErrorOrigin::Response,
            format!("no encoder for accept value '{accept}'"),
        )
    }

    pub(crate) fn encode(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Response(ResponseErrorKind::Encode),
            ErrorOrigin::Response,
            message,
        )
    }

    /// HTTP status this error maps to at the REST boundary.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match &self.kind {
            ErrorKind::Request(_) => 400,
            ErrorKind::Store(StoreErrorKind::TableNotFound) => 404,
            ErrorKind::Store(_) => 503,
            ErrorKind::Response(ResponseErrorKind::NotAcceptable) => 406,
            ErrorKind::Response(ResponseErrorKind::Encode) | ErrorKind::Internal => 500,
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = if err.is_table_not_found() {
            ErrorKind::Store(StoreErrorKind::TableNotFound)
        } else {
            match (err.origin, err.class) {
                (CoreErrorOrigin::Store, ErrorClass::Corruption) => {
                    ErrorKind::Store(StoreErrorKind::Corrupt)
                }
                (CoreErrorOrigin::Store, _) => ErrorKind::Store(StoreErrorKind::Unavailable),
                (CoreErrorOrigin::Fetch, _) => ErrorKind::Internal,
            }
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<MultiGetError> for Error {
    fn from(err: MultiGetError) -> Self {
        match err {
            MultiGetError::InvalidParameter(_) => Self::new(
                ErrorKind::Request(RequestErrorKind::InvalidParameter),
                ErrorOrigin::Request,
                err.to_string(),
            ),

            MultiGetError::InvalidEncoding(_) => Self::new(
                ErrorKind::Request(RequestErrorKind::InvalidEncoding),
                ErrorOrigin::Request,
                err.to_string(),
            ),

            MultiGetError::FilterSyntax(_) => Self::new(
                ErrorKind::Request(RequestErrorKind::FilterSyntax),
                ErrorOrigin::Filter,
                err.to_string(),
            ),

            MultiGetError::StorageAccess(err) => err.into(),
        }
    }
}

///
/// ErrorKind
/// Public error taxonomy for REST callers and canister interfaces.
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Request(RequestErrorKind),
    Store(StoreErrorKind),
    Response(ResponseErrorKind),

    /// The caller cannot remediate this.
    Internal,
}

///
/// RequestErrorKind
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RequestErrorKind {
    /// Bad parameter value or too many row keys.
    InvalidParameter,

    /// Unknown key encoding or an undecodable key.
    InvalidEncoding,

    /// Filter expression could not be parsed.
    FilterSyntax,
}

///
/// StoreErrorKind
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum StoreErrorKind {
    TableNotFound,
    Unavailable,
    Corrupt,
}

///
/// ResponseErrorKind
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ResponseErrorKind {
    /// No encoder matches the requested media type.
    NotAcceptable,

    /// Encoding the result body failed.
    Encode,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(CandidType, Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Request,
    Filter,
    Store,
    Fetch,
    Response,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Store => Self::Store,
            CoreErrorOrigin::Fetch => Self::Fetch,
        }
    }
}

///
/// TESTS
///
