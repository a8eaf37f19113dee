use thiserror::Error;

/// Name of the wire service every call is routed to.
pub const DATASTORE_SERVICE: &str = "datastore_v3";

/// An application-level failure reported by the transport.
///
/// `code` is one of the wire error codes in [`crate::api::ErrorCode`];
/// anything else is treated as an internal error by the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("application error {code}: {detail}")]
pub struct RpcError {
    /// The wire error code.
    pub code: i32,
    /// Human-readable detail supplied by the server.
    pub detail: String,
}

impl RpcError {
    /// Creates an application error from a wire code and detail message.
    pub fn new(code: i32, detail: impl Into<String>) -> RpcError {
        RpcError {
            code,
            detail: detail.into(),
        }
    }
}

/// A synchronous request/response RPC channel.
///
/// The client encodes every request with prost and hands the bytes to the
/// channel; the channel blocks until the store answers and returns the
/// encoded response, or the application error the store reported instead.
pub trait Dispatch {
    /// Performs one synchronous call against `method` of `service`.
    fn call(&self, service: &str, method: &str, request: &[u8]) -> Result<Vec<u8>, RpcError>;
}

impl<D: Dispatch + ?Sized> Dispatch for &D {
    fn call(&self, service: &str, method: &str, request: &[u8]) -> Result<Vec<u8>, RpcError> {
        (**self).call(service, method, request)
    }
}
