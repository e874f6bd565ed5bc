//! The top-level [`Server`] aggregate: owns every piece of session
//! state the dispatcher, lifecycle machine, and configuration subsystem
//! mutate, and exposes the single byte-slice entry point the transport (out
//! of scope) drives.

use std::sync::Arc;

use crate::capabilities::{ClientCapabilities, OffsetEncoding, Tuning};
use crate::collaborators::{CodeActionBuilder, DocumentStore, NullCollaborators, SyntaxChecker};
use crate::config::Config;
use crate::status::Status;
use crate::wire::OutboundQueue;

mod autofix;
mod configuration;
mod dispatch;
mod handlers;
mod lifecycle;

/// Construction parameters for a [`Server`].
pub struct ServerOptions {
    pub config: Config,
    /// Disables configuration pull to keep a recorded session
    /// deterministic on replay.
    pub recording: bool,
    /// Disables configuration pull and apply when replaying a
    /// previously recorded session.
    pub replay: bool,
    /// Enables message tracing independent of whatever the client's
    /// `initialize.trace` field later negotiates.
    pub trace: bool,
    /// The installed language-toolchain version, if known, used to warn
    /// about version skew at `initialize` time.
    pub toolchain_version: Option<String>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerOptions {
            config: Config::default(),
            recording: false,
            replay: false,
            trace: false,
            toolchain_version: None,
        }
    }
}

/// The top-level aggregate. A `Server` is constructed once per session
/// and fed raw inbound frames one at a time via [`Server::handle_message`];
/// outbound frames accumulate on its [`OutboundQueue`] for the transport to
/// drain via [`Server::pop_outbound`].
pub struct Server {
    pub(crate) status: Status,
    pub(crate) config: Config,
    pub(crate) client_capabilities: ClientCapabilities,
    pub(crate) offset_encoding: OffsetEncoding,
    pub(crate) tuning: Tuning,
    pub(crate) outbound: OutboundQueue,
    pub(crate) document_store: Arc<dyn DocumentStore>,
    pub(crate) syntax_checker: Arc<dyn SyntaxChecker>,
    pub(crate) code_actions: Arc<dyn CodeActionBuilder>,
    pub(crate) recording: bool,
    pub(crate) replay: bool,
    pub(crate) trace: bool,
    pub(crate) toolchain_version: Option<String>,
}

impl Server {
    /// Constructs a `Server` whose external collaborators are all
    /// no-ops. Sufficient for exercising the dispatcher, lifecycle, and
    /// configuration subsystem on their own, as this crate's own tests do.
    pub fn new(options: ServerOptions) -> Self {
        Server::with_collaborators(options, Arc::new(NullCollaborators), Arc::new(NullCollaborators), Arc::new(NullCollaborators))
    }

    /// Constructs a `Server` wired to real collaborators.
    pub fn with_collaborators(
        options: ServerOptions,
        document_store: Arc<dyn DocumentStore>,
        syntax_checker: Arc<dyn SyntaxChecker>,
        code_actions: Arc<dyn CodeActionBuilder>,
    ) -> Self {
        Server {
            status: Status::Uninitialized,
            config: options.config,
            client_capabilities: ClientCapabilities::default(),
            offset_encoding: OffsetEncoding::Utf16,
            tuning: Tuning::default(),
            outbound: OutboundQueue::new(),
            document_store,
            syntax_checker,
            code_actions,
            recording: options.recording,
            replay: options.replay,
            trace: options.trace,
            toolchain_version: options.toolchain_version,
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The effective configuration, read-only from outside the
    /// crate; mutated only through the pull/push paths in [`configuration`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The frozen client-capability snapshot negotiated at `initialize`.
    /// All `false` before `initialize` completes.
    pub fn client_capabilities(&self) -> ClientCapabilities {
        self.client_capabilities
    }

    /// The offset encoding chosen at `initialize`.
    pub fn offset_encoding(&self) -> OffsetEncoding {
        self.offset_encoding
    }

    /// Removes and returns the oldest queued outbound frame, if any;
    /// the transport (out of scope) drains these.
    pub fn pop_outbound(&mut self) -> Option<Vec<u8>> {
        self.outbound.pop_front()
    }

    /// Number of frames currently queued for the transport.
    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    /// Decodes and dispatches one raw inbound JSON-RPC frame. This is
    /// the single entry point the transport drives; everything else in this
    /// crate is reached only from here.
    pub fn handle_message(&mut self, bytes: &[u8]) {
        dispatch::handle_message(self, bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn feed(server: &mut Server, json: serde_json::Value) {
        server.handle_message(json.to_string().as_bytes());
    }

    fn pop_value(server: &mut Server) -> Value {
        let frame = server.pop_outbound().expect("expected a queued outbound frame");
        serde_json::from_slice(&frame).unwrap()
    }

    fn init_request(id: i64) -> serde_json::Value {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "initialize",
            "params": {"capabilities": {}},
        })
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut server = Server::new(ServerOptions::default());

        feed(&mut server, init_request(1));
        let response = pop_value(&mut server);
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["serverInfo"]["name"], "zls");
        assert_eq!(server.status(), Status::Initializing);

        feed(&mut server, serde_json::json!({"jsonrpc": "2.0", "method": "initialized", "params": {}}));
        assert!(server.pop_outbound().is_none());
        assert_eq!(server.status(), Status::Initialized);

        feed(&mut server, serde_json::json!({"jsonrpc": "2.0", "id": 2, "method": "shutdown"}));
        let response = pop_value(&mut server);
        assert_eq!(response["id"], 2);
        assert!(response["result"].is_null());
        assert_eq!(server.status(), Status::Shutdown);

        feed(&mut server, serde_json::json!({"jsonrpc": "2.0", "method": "exit"}));
        assert_eq!(server.status(), Status::ExitingSuccess);
    }

    #[test]
    fn pre_initialize_request_is_rejected() {
        let mut server = Server::new(ServerOptions::default());
        feed(&mut server, serde_json::json!({"jsonrpc": "2.0", "id": 7, "method": "textDocument/hover", "params": {}}));
        let response = pop_value(&mut server);
        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["code"], -32002);
    }

    #[test]
    fn unknown_method_after_initialize_is_method_not_found() {
        let mut server = Server::new(ServerOptions::default());
        feed(&mut server, init_request(1));
        server.pop_outbound();
        feed(&mut server, serde_json::json!({"jsonrpc": "2.0", "method": "initialized", "params": {}}));

        feed(&mut server, serde_json::json!({"jsonrpc": "2.0", "id": 9, "method": "textDocument/banana"}));
        let response = pop_value(&mut server);
        assert_eq!(response["id"], 9);
        assert_eq!(response["error"]["code"], -32601);
    }

    #[test]
    fn exiting_without_shutdown_goes_to_exiting_failure() {
        let mut server = Server::new(ServerOptions::default());
        feed(&mut server, init_request(1));
        server.pop_outbound();
        feed(&mut server, serde_json::json!({"jsonrpc": "2.0", "method": "initialized", "params": {}}));

        feed(&mut server, serde_json::json!({"jsonrpc": "2.0", "method": "exit"}));
        assert_eq!(server.status(), Status::ExitingFailure);
    }
}
