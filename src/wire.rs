//! Builds outbound JSON-RPC frames and appends them to the [`OutboundQueue`].
//! The core never writes to the transport directly; it only ever
//! appends owned buffers here, and the transport (out of scope) drains
//! them.

use serde::Serialize;
use serde_json::Value;

use crate::message::{RequestId, ResponseError};

/// Sentinel marking an explicit `"result": null` payload, as opposed to
/// "no payload key at all".
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPayload;

impl Serialize for NullPayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_none()
    }
}

/// A single outbound JSON-RPC frame, not yet serialized.
enum Frame {
    /// A response to an inbound request: exactly one of `result`/`error`.
    Response {
        id: RequestId,
        result: Option<Value>,
        error: Option<ResponseError>,
    },
    /// A server-originated request awaiting a client response.
    Request {
        id: RequestId,
        method: &'static str,
        params: Value,
    },
    /// A one-way server-originated notification.
    Notification { method: &'static str, params: Value },
}

/// An ordered, append-only queue of serialized outbound frames, drained by
/// the transport. Allocation failure while enqueueing is logged and
/// swallowed: the core never blocks a handler on the transport.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    frames: Vec<Vec<u8>>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        OutboundQueue { frames: Vec::new() }
    }

    /// Returns and removes the oldest enqueued frame, if any.
    pub fn pop_front(&mut self) -> Option<Vec<u8>> {
        if self.frames.is_empty() {
            None
        } else {
            Some(self.frames.remove(0))
        }
    }

    /// Number of frames currently queued.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.frames.iter().map(|v| v.as_slice())
    }

    fn push(&mut self, frame: Frame) {
        match serialize_frame(&frame) {
            Ok(bytes) => self.frames.push(bytes),
            Err(e) => {
                log::error!("dropping outbound frame: failed to serialize ({e})");
            }
        }
    }

    /// Enqueues a successful response. `result` uses the null-field-omitting
    /// serializer policy for optional fields within the payload itself; pass
    /// [`NullPayload`]-shaped values when the protocol mandates an explicit
    /// `null` result (e.g. `shutdown`).
    pub fn respond_ok<T: Serialize>(&mut self, id: RequestId, result: &T) {
        let result = serde_json::to_value(result).unwrap_or(Value::Null);
        self.push(Frame::Response { id, result: Some(result), error: None });
    }

    /// Enqueues a response with an explicit `null` result.
    pub fn respond_null(&mut self, id: RequestId) {
        self.push(Frame::Response { id, result: Some(Value::Null), error: None });
    }

    /// Enqueues a failed response.
    pub fn respond_err(&mut self, id: RequestId, error: ResponseError) {
        self.push(Frame::Response { id, result: None, error: Some(error) });
    }

    /// Enqueues a server-originated request awaiting a correlated response.
    pub fn request<T: Serialize>(&mut self, id: RequestId, method: &'static str, params: &T) {
        let params = serde_json::to_value(params).unwrap_or(Value::Null);
        self.push(Frame::Request { id, method, params });
    }

    /// Enqueues a one-way server-originated notification.
    pub fn notify<T: Serialize>(&mut self, method: &'static str, params: &T) {
        let params = serde_json::to_value(params).unwrap_or(Value::Null);
        self.push(Frame::Notification { method, params });
    }
}

fn serialize_frame(frame: &Frame) -> serde_json::Result<Vec<u8>> {
    #[derive(Serialize)]
    struct Wire<'a> {
        jsonrpc: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<&'a RequestId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        method: Option<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<&'a Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        params: Option<&'a Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<&'a ResponseError>,
    }

    let wire = match frame {
        Frame::Response { id, result, error } => Wire {
            jsonrpc: "2.0",
            id: Some(id),
            method: None,
            result: result.as_ref(),
            params: None,
            error: error.as_ref(),
        },
        Frame::Request { id, method, params } => Wire {
            jsonrpc: "2.0",
            id: Some(id),
            method: Some(method),
            result: None,
            params: Some(params),
            error: None,
        },
        Frame::Notification { method, params } => Wire {
            jsonrpc: "2.0",
            id: None,
            method: Some(method),
            result: None,
            params: Some(params),
            error: None,
        },
    };

    serde_json::to_vec(&wire)
}
