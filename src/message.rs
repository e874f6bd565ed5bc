//! The JSON-RPC 2.0 message model: decoding raw JSON into a typed [`Message`],
//! and the `RequestId`/`ResponseError` types that correlate requests to
//! responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DispatchError;

/// A request/response correlator. JSON-RPC allows either an integer or a
/// string id; we keep both representations rather than coercing one into
/// the other; well-known server-originated ids (`register-*`,
/// `apply_edit`, `i_haz_configuration`) are always strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl RequestId {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestId::String(s) => Some(s),
            RequestId::Number(_) => None,
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// The error body of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        ResponseError {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Translates a taxonomy member into a wire error: the numeric code
    /// is the member's protocol-reserved value, the message is its name.
    ///
    /// Panics if handed `DispatchError::OutOfMemory`, which is never
    /// protocol-visible — callers must filter it out before calling.
    pub fn from_taxonomy(err: &DispatchError) -> Self {
        debug_assert!(err.is_protocol_visible(), "OutOfMemory must never reach the wire");
        ResponseError::new(err.code(), err.to_string())
    }
}

/// A decoded JSON-RPC 2.0 message, classified by presence of `id`/`method`.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request {
        id: RequestId,
        method: String,
        params: Value,
    },
    Notification {
        method: String,
        params: Value,
    },
    Response {
        id: RequestId,
        result: Option<Value>,
        error: Option<ResponseError>,
    },
}

impl Message {
    /// Decodes a single JSON value into a request, notification, or response.
    ///
    /// - `id` + `method` present → `Request` (params default to `null`).
    /// - `id` present, `method` absent → `Response`; exactly one of
    ///   `result`/`error` may be non-null.
    /// - `id` absent, `method` present → `Notification` (params default to `null`).
    /// - Anything else → `ParseError`.
    pub fn decode(value: Value) -> Result<Message, DispatchError> {
        let Value::Object(mut obj) = value else {
            return Err(DispatchError::ParseError);
        };

        let id = match obj.remove("id") {
            Some(Value::Null) | None => None,
            Some(id_value) => Some(decode_request_id(id_value)?),
        };
        let method = match obj.remove("method") {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => None,
            Some(_) => return Err(DispatchError::ParseError),
        };

        match (id, method) {
            (Some(id), Some(method)) => {
                let params = obj.remove("params").unwrap_or(Value::Null);
                Ok(Message::Request { id, method, params })
            }
            (Some(id), None) => {
                let result = obj.remove("result").filter(|v| !v.is_null());
                let error = match obj.remove("error") {
                    Some(Value::Null) | None => None,
                    Some(err_value) => Some(serde_json::from_value::<ResponseError>(err_value)?),
                };
                if result.is_some() && error.is_some() {
                    return Err(DispatchError::ParseError);
                }
                Ok(Message::Response { id, result, error })
            }
            (None, Some(method)) => {
                let params = obj.remove("params").unwrap_or(Value::Null);
                Ok(Message::Notification { method, params })
            }
            (None, None) => Err(DispatchError::ParseError),
        }
    }

    /// Decodes a raw JSON-RPC text frame end to end: text → `Value` → `Message`.
    pub fn decode_str(text: &str) -> Result<Message, DispatchError> {
        let value: Value = serde_json::from_str(text)?;
        Message::decode(value)
    }
}

fn decode_request_id(value: Value) -> Result<RequestId, DispatchError> {
    match value {
        Value::Number(n) if n.is_i64() => Ok(RequestId::Number(n.as_i64().unwrap())),
        Value::Number(n) if n.is_u64() => Ok(RequestId::Number(n.as_u64().unwrap() as i64)),
        Value::String(s) => Ok(RequestId::String(s)),
        _ => Err(DispatchError::ParseError),
    }
}
