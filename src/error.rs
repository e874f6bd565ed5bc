//! The closed error taxonomy surfaced to clients as JSON-RPC `ResponseError`s.
//!
//! Every member carries the protocol-reserved numeric code from the LSP and
//! JSON-RPC 2.0 specifications; `Display` yields exactly the member's name,
//! which doubles as the `message` field of the resulting `ResponseError`
//! (see [`DispatchError::code`] and [`crate::message::ResponseError::from_taxonomy`]).

use thiserror::Error;

/// The closed set of errors the dispatcher can surface to a client.
///
/// `OutOfMemory` is the one exception: it is a transport-internal concern,
/// always logged and never turned into a `ResponseError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("ParseError")]
    ParseError,
    #[error("InvalidRequest")]
    InvalidRequest,
    #[error("MethodNotFound")]
    MethodNotFound,
    #[error("InvalidParams")]
    InvalidParams,
    #[error("InternalError")]
    InternalError,
    #[error("ServerNotInitialized")]
    ServerNotInitialized,
    #[error("RequestFailed")]
    RequestFailed,
    #[error("ServerCancelled")]
    ServerCancelled,
    #[error("ContentModified")]
    ContentModified,
    #[error("RequestCancelled")]
    RequestCancelled,
    /// Transport-internal; never surfaced as a protocol error.
    #[error("OutOfMemory")]
    OutOfMemory,
}

impl DispatchError {
    /// The protocol-reserved numeric code for this taxonomy member.
    ///
    /// `OutOfMemory` has no wire representation; callers must not surface it
    /// to a client. It is given a code here only so logging call sites can
    /// treat all taxonomy members uniformly.
    pub const fn code(&self) -> i64 {
        match self {
            DispatchError::ParseError => -32700,
            DispatchError::InvalidRequest => -32600,
            DispatchError::MethodNotFound => -32601,
            DispatchError::InvalidParams => -32602,
            DispatchError::InternalError => -32603,
            DispatchError::ServerNotInitialized => -32002,
            DispatchError::RequestFailed => -32803,
            DispatchError::ServerCancelled => -32802,
            DispatchError::ContentModified => -32801,
            DispatchError::RequestCancelled => -32800,
            DispatchError::OutOfMemory => 0,
        }
    }

    /// Whether this member may ever be surfaced to the client.
    pub const fn is_protocol_visible(&self) -> bool {
        !matches!(self, DispatchError::OutOfMemory)
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(_: serde_json::Error) -> Self {
        DispatchError::ParseError
    }
}
