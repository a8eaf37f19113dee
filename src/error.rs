use thiserror::Error;

use crate::api::ErrorCode;
use crate::dispatch::RpcError;

/// The main error-handling type.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller passed a wrong-typed or missing argument.
    #[error("bad argument: {0}")]
    BadArgument(String),
    /// An invalid property name.
    #[error("bad property: {0}")]
    BadProperty(String),
    /// An invalid or unsupported property value.
    #[error("bad value: {0}")]
    BadValue(String),
    /// A filter expression could not be parsed, or violates a cross-filter
    /// invariant.
    #[error("bad filter: {0}")]
    BadFilter(String),
    /// A query-level invariant was violated, such as an unsupported count
    /// configuration.
    #[error("bad query: {0}")]
    BadQuery(String),
    /// A key was incomplete where a complete key is required.
    #[error("bad key: {0}")]
    BadKey(String),
    /// A semantic violation, surfaced by the server or by a client pre-check.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// No entity exists for the requested key.
    #[error("entity not found")]
    EntityNotFound,
    /// A transaction could not be committed.
    #[error("transaction failed: {0}")]
    TransactionFailed(String),
    /// The query requires an index that does not exist.
    #[error("need index: {0}")]
    NeedIndex(String),
    /// The store did not answer in time.
    #[error("timeout: {0}")]
    Timeout(String),
    /// An unexpected server-side failure.
    #[error("internal error: {0}")]
    Internal(String),
    /// The store returned data the client cannot make sense of.
    #[error("corrupt data: {0}")]
    Corrupt(String),
    /// Sentinel raised inside [`Client::run_in_transaction`] to request a
    /// rollback without surfacing a failure to the caller. Never propagated
    /// out of the transaction runner.
    ///
    /// [`Client::run_in_transaction`]: crate::Client::run_in_transaction
    #[error("rollback requested")]
    Rollback,
}

impl Error {
    /// Maps a wire-reported application error to the client-side taxonomy.
    /// Unknown codes surface as [`Error::Internal`].
    pub(crate) fn from_rpc(err: RpcError) -> Error {
        match ErrorCode::try_from(err.code) {
            Ok(ErrorCode::BadRequest) => Error::BadRequest(err.detail),
            Ok(ErrorCode::ConcurrentTransaction) => Error::TransactionFailed(err.detail),
            Ok(ErrorCode::InternalError) => Error::Internal(err.detail),
            Ok(ErrorCode::NeedIndex) => Error::NeedIndex(err.detail),
            Ok(ErrorCode::Timeout) => Error::Timeout(err.detail),
            Err(_) => Error::Internal(err.detail),
        }
    }
}
