//! The handler table: a static association from LSP method name to a
//! typed handler function. Each entry's `invoke` erases its own parameter
//! type internally (decoding from the raw [`Value`] itself), so the
//! dispatcher never has to materialize a union of every handler's params.
//!
//! Feature handlers here consult [`crate::collaborators::DocumentStore`] to
//! resolve a URI to an open buffer; an unknown URI answers with a null
//! result rather than an error. The actual analysis — what hover
//! text to show, what a `goto definition` resolves to — belongs to the
//! syntax tree builder and semantic analyser, both out of scope: this
//! core only proves the URI is live and lets the typed result default to
//! "nothing found yet".

use lsp_types::*;
use serde_json::Value;

use crate::arena::RequestArena;
use crate::error::DispatchError;

use super::{autofix, configuration};
use super::Server;

pub(crate) struct RequestHandler {
    method: &'static str,
    pub(crate) invoke: fn(&mut Server, &RequestArena, Value) -> Result<Value, DispatchError>,
}

pub(crate) struct NotificationHandler {
    method: &'static str,
    pub(crate) invoke: fn(&mut Server, &RequestArena, Value) -> Result<(), DispatchError>,
}

pub(crate) fn find_request(method: &str) -> Option<&'static RequestHandler> {
    REQUESTS.iter().find(|h| h.method == method)
}

pub(crate) fn find_notification(method: &str) -> Option<&'static NotificationHandler> {
    NOTIFICATIONS.iter().find(|h| h.method == method)
}

static REQUESTS: &[RequestHandler] = &[
    RequestHandler { method: "initialize", invoke: super::lifecycle::initialize },
    RequestHandler { method: "shutdown", invoke: super::lifecycle::shutdown },
    RequestHandler { method: "textDocument/willSaveWaitUntil", invoke: will_save_wait_until },
    RequestHandler { method: "textDocument/completion", invoke: completion },
    RequestHandler { method: "textDocument/signatureHelp", invoke: signature_help },
    RequestHandler { method: "textDocument/definition", invoke: definition },
    RequestHandler { method: "textDocument/typeDefinition", invoke: type_definition },
    RequestHandler { method: "textDocument/implementation", invoke: implementation },
    RequestHandler { method: "textDocument/declaration", invoke: declaration },
    RequestHandler { method: "textDocument/hover", invoke: hover },
    RequestHandler { method: "textDocument/documentSymbol", invoke: document_symbol },
    RequestHandler { method: "textDocument/formatting", invoke: formatting },
    RequestHandler { method: "textDocument/rename", invoke: rename },
    RequestHandler { method: "textDocument/references", invoke: references },
    RequestHandler { method: "textDocument/documentHighlight", invoke: document_highlight },
    RequestHandler { method: "textDocument/codeAction", invoke: code_action },
    RequestHandler { method: "textDocument/foldingRange", invoke: folding_range },
    RequestHandler { method: "textDocument/selectionRange", invoke: selection_range },
    RequestHandler { method: "textDocument/semanticTokens/full", invoke: semantic_tokens_full },
    RequestHandler { method: "textDocument/semanticTokens/range", invoke: semantic_tokens_range },
    RequestHandler { method: "textDocument/inlayHint", invoke: inlay_hint },
];

static NOTIFICATIONS: &[NotificationHandler] = &[
    NotificationHandler { method: "initialized", invoke: super::lifecycle::initialized },
    NotificationHandler { method: "exit", invoke: super::lifecycle::exit },
    NotificationHandler { method: "$/cancelRequest", invoke: cancel_request },
    NotificationHandler { method: "$/setTrace", invoke: set_trace },
    NotificationHandler { method: "$/progress", invoke: progress },
    NotificationHandler { method: "textDocument/didOpen", invoke: did_open },
    NotificationHandler { method: "textDocument/didChange", invoke: did_change },
    NotificationHandler { method: "textDocument/didSave", invoke: did_save },
    NotificationHandler { method: "textDocument/didClose", invoke: did_close },
    NotificationHandler { method: "workspace/didChangeConfiguration", invoke: configuration::did_change_configuration },
];

fn decode<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, DispatchError> {
    Ok(serde_json::from_value(params)?)
}

fn ok<T: serde::Serialize>(value: T) -> Result<Value, DispatchError> {
    Ok(serde_json::to_value(value).unwrap_or(Value::Null))
}

/// True if the document store knows about `uri`.
fn is_open(server: &Server, uri: &Url) -> bool {
    server.document_store.text(uri).is_some()
}

fn will_save_wait_until(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: WillSaveTextDocumentParams = decode(params)?;
    let uri = params.text_document.uri;
    let Some(text) = server.document_store.text(&uri) else {
        return ok(Option::<Vec<TextEdit>>::None);
    };
    if autofix::mode(server) != autofix::AutofixMode::WillSaveWaitUntil {
        return ok(Option::<Vec<TextEdit>>::None);
    }
    let edits = autofix::compute_fixall_edits(server, &uri, &text);
    ok(Some(edits))
}

fn completion(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: CompletionParams = decode(params)?;
    let uri = &params.text_document_position.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<CompletionResponse>::None)
}

fn signature_help(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: SignatureHelpParams = decode(params)?;
    let uri = &params.text_document_position_params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<SignatureHelp>::None)
}

fn definition(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: GotoDefinitionParams = decode(params)?;
    let uri = &params.text_document_position_params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<GotoDefinitionResponse>::None)
}

fn type_definition(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: GotoTypeDefinitionParams = decode(params)?;
    let uri = &params.text_document_position_params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<GotoTypeDefinitionResponse>::None)
}

fn implementation(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: GotoImplementationParams = decode(params)?;
    let uri = &params.text_document_position_params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<GotoImplementationResponse>::None)
}

fn declaration(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: GotoDeclarationParams = decode(params)?;
    let uri = &params.text_document_position_params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<GotoDeclarationResponse>::None)
}

fn hover(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: HoverParams = decode(params)?;
    let uri = &params.text_document_position_params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<Hover>::None)
}

fn document_symbol(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: DocumentSymbolParams = decode(params)?;
    let uri = &params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<DocumentSymbolResponse>::None)
}

fn formatting(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: DocumentFormattingParams = decode(params)?;
    let uri = &params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<Vec<TextEdit>>::None)
}

fn rename(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: RenameParams = decode(params)?;
    let uri = &params.text_document_position.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<WorkspaceEdit>::None)
}

fn references(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: ReferenceParams = decode(params)?;
    let uri = &params.text_document_position.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<Vec<Location>>::None)
}

fn document_highlight(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: DocumentHighlightParams = decode(params)?;
    let uri = &params.text_document_position_params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<Vec<DocumentHighlight>>::None)
}

/// Unlike the other feature handlers, `codeAction` has real collaborator
/// work to do: the client hands us diagnostics for the range directly
/// (no syntax checker round-trip needed), so we can run them through the
/// code-action builder the same way autofix does.
fn code_action(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: CodeActionParams = decode(params)?;
    let uri = &params.text_document.uri;
    if !is_open(server, uri) {
        return ok(Option::<CodeActionResponse>::None);
    }
    let actions = server.code_actions.build(&params.context.diagnostics, uri);
    ok(Some(actions))
}

fn folding_range(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: FoldingRangeParams = decode(params)?;
    let uri = &params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<Vec<FoldingRange>>::None)
}

fn selection_range(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: SelectionRangeParams = decode(params)?;
    let uri = &params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<Vec<SelectionRange>>::None)
}

fn semantic_tokens_full(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: SemanticTokensParams = decode(params)?;
    let uri = &params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<SemanticTokensResult>::None)
}

fn semantic_tokens_range(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: SemanticTokensRangeParams = decode(params)?;
    let uri = &params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<SemanticTokensRangeResult>::None)
}

fn inlay_hint(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: InlayHintParams = decode(params)?;
    let uri = &params.text_document.uri;
    let _ = is_open(server, uri);
    ok(Option::<Vec<InlayHint>>::None)
}

fn did_open(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<(), DispatchError> {
    let params: DidOpenTextDocumentParams = decode(params)?;
    let doc = params.text_document;
    server.document_store.open(&doc.uri, doc.text, doc.version);
    Ok(())
}

fn did_change(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<(), DispatchError> {
    let mut params: DidChangeTextDocumentParams = decode(params)?;
    let uri = params.text_document.uri.clone();
    let version = params.text_document.version;
    // Incremental merging belongs to the document store's own diff engine
    // (out of scope here); the most recent change event's text is the
    // closest approximation this core can offer on its own.
    if let Some(last) = params.content_changes.pop() {
        server.document_store.change(&uri, last.text, version);
    }
    Ok(())
}

fn did_save(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<(), DispatchError> {
    let params: DidSaveTextDocumentParams = decode(params)?;
    let uri = params.text_document.uri;
    server.document_store.save(&uri);
    if autofix::mode(server) == autofix::AutofixMode::OnSave {
        if let Some(text) = server.document_store.text(&uri) {
            autofix::apply_on_save(server, &uri, &text);
        }
    }
    Ok(())
}

fn did_close(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<(), DispatchError> {
    let params: DidCloseTextDocumentParams = decode(params)?;
    server.document_store.close(&params.text_document.uri);
    Ok(())
}

/// `$/cancelRequest` is accepted but a no-op in the core: there is
/// no cancellation-token map yet, so handlers always run to completion.
fn cancel_request(_server: &mut Server, _arena: &RequestArena, params: Value) -> Result<(), DispatchError> {
    let params: CancelParams = decode(params)?;
    log::trace!("$/cancelRequest for {:?} is a no-op in this core", params.id);
    Ok(())
}

fn set_trace(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<(), DispatchError> {
    let params: SetTraceParams = decode(params)?;
    server.trace = !matches!(params.value, TraceValue::Off);
    Ok(())
}

/// `$/progress` notifications may arrive from the client at any time,
/// including during `initializing`; the core has nothing to do with
/// them beyond accepting them without error.
fn progress(_server: &mut Server, _arena: &RequestArena, _params: Value) -> Result<(), DispatchError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ServerOptions;
    use serde_json::json;

    fn initialized_server() -> Server {
        let mut server = Server::new(ServerOptions::default());
        let arena = RequestArena::new();
        super::lifecycle::initialize(&mut server, &arena, json!({"capabilities": {}})).unwrap();
        super::lifecycle::initialized(&mut server, &arena, serde_json::Value::Null).unwrap();
        server
    }

    #[test]
    fn hover_on_unknown_uri_returns_null() {
        let mut server = initialized_server();
        let arena = RequestArena::new();
        let params = json!({
            "textDocument": {"uri": "file:///tmp/a.zig"},
            "position": {"line": 0, "character": 0},
        });
        let result = hover(&mut server, &arena, params).unwrap();
        assert!(result.is_null());
    }

    #[test]
    fn code_action_on_unknown_uri_returns_null() {
        let mut server = initialized_server();
        let arena = RequestArena::new();
        let params = json!({
            "textDocument": {"uri": "file:///tmp/a.zig"},
            "range": {"start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 0}},
            "context": {"diagnostics": []},
        });
        let result = code_action(&mut server, &arena, params).unwrap();
        assert!(result.is_null());
    }

    #[test]
    fn cancel_request_is_a_no_op() {
        let mut server = initialized_server();
        let arena = RequestArena::new();
        assert!(cancel_request(&mut server, &arena, json!({"id": 1})).is_ok());
    }

    #[test]
    fn set_trace_toggles_tracing() {
        let mut server = initialized_server();
        let arena = RequestArena::new();
        set_trace(&mut server, &arena, json!({"value": "messages"})).unwrap();
        assert!(server.trace);
        set_trace(&mut server, &arena, json!({"value": "off"})).unwrap();
        assert!(!server.trace);
    }

    #[test]
    fn did_open_then_did_close_round_trips_through_the_store() {
        // NullCollaborators never reports a URI as open, but the handlers
        // must still decode and invoke without error.
        let mut server = initialized_server();
        let arena = RequestArena::new();
        let params = json!({
            "textDocument": {"uri": "file:///tmp/a.zig", "languageId": "zig", "version": 1, "text": "const x = 1;"}
        });
        assert!(did_open(&mut server, &arena, params).is_ok());
        let params = json!({"textDocument": {"uri": "file:///tmp/a.zig"}});
        assert!(did_close(&mut server, &arena, params).is_ok());
    }
}
