//! Request-dispatch core for a Language Server Protocol server: JSON-RPC
//! framing, the LSP lifecycle state machine, capability negotiation,
//! configuration pull/push, and typed dispatch of client messages.
//!
//! The syntax tree builder, semantic analyser, document store, individual
//! feature providers, external syntax-checker process, and compile-time
//! interpreter are all out of scope here — this crate consumes them only
//! through the trait contracts in [`collaborators`].

pub mod arena;
pub mod capabilities;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod message;
pub mod server;
pub mod status;
pub mod transport;
pub mod wire;

pub use error::DispatchError;
pub use message::{Message, RequestId, ResponseError};
pub use server::{Server, ServerOptions};
pub use status::Status;
pub use wire::OutboundQueue;
