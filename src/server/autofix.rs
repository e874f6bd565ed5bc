//! Autofix: applying `source.fixAll` code actions automatically
//! around a save, either by rewriting the saved document in place
//! (`on_save`) or by answering `willSaveWaitUntil` with the edits directly.
//! Which of the two (or neither) is active depends on configuration and on
//! what the client actually told us it supports at `initialize`.

use lsp_types::{
    ApplyWorkspaceEditParams, CodeActionKind, CodeActionOrCommand, TextDocumentEdit, TextEdit, Url, WorkspaceEdit,
};

use crate::message::RequestId;

use super::Server;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AutofixMode {
    None,
    OnSave,
    WillSaveWaitUntil,
}

/// Picks the active autofix mode: disabled in config, or the client
/// lacking `workspace/applyEdit` support, both force `None`; a client that
/// can answer `willSaveWaitUntil` itself gets edits returned synchronously
/// instead of a follow-up `workspace/applyEdit` round trip.
pub(crate) fn mode(server: &Server) -> AutofixMode {
    if !server.config.enable_autofix {
        return AutofixMode::None;
    }
    if !server.client_capabilities.apply_edits {
        return AutofixMode::None;
    }
    if server.client_capabilities.will_save_wait_until {
        AutofixMode::WillSaveWaitUntil
    } else {
        AutofixMode::OnSave
    }
}

/// Runs the syntax checker, builds code actions from its diagnostics, and
/// keeps only the `source.fixAll` actions whose edit touches exactly the
/// one URI being fixed.
pub(crate) fn compute_fixall_edits(server: &Server, uri: &Url, text: &str) -> Vec<TextEdit> {
    let diagnostics = server.syntax_checker.check(uri, text);
    let actions = server.code_actions.build(&diagnostics, uri);

    let mut edits = Vec::new();
    for action in actions {
        let CodeActionOrCommand::CodeAction(action) = action else {
            continue;
        };
        if !matches!(&action.kind, Some(kind) if *kind == CodeActionKind::SOURCE_FIX_ALL) {
            continue;
        }
        let Some(edit) = &action.edit else {
            continue;
        };
        edits.extend(edits_for_uri(edit, uri));
    }
    edits
}

/// Extracts the edits targeting exactly `uri` from a `WorkspaceEdit`,
/// preferring `document_changes` over the legacy `changes` map when both
/// are present.
fn edits_for_uri(edit: &WorkspaceEdit, uri: &Url) -> Vec<TextEdit> {
    if let Some(lsp_types::DocumentChanges::Edits(edits)) = &edit.document_changes {
        let matching: Vec<&TextDocumentEdit> = edits.iter().filter(|e| &e.text_document.uri == uri).collect();
        if matching.len() == 1 {
            return matching[0]
                .edits
                .iter()
                .map(|e| match e {
                    lsp_types::OneOf::Left(edit) => edit.clone(),
                    lsp_types::OneOf::Right(annotated) => annotated.text_edit.clone(),
                })
                .collect();
        }
        return Vec::new();
    }

    if let Some(changes) = &edit.changes {
        if changes.len() == 1 {
            if let Some(edits) = changes.get(uri) {
                return edits.clone();
            }
        }
    }

    Vec::new()
}

/// Rewrites the document in place by issuing `workspace/applyEdit` with the
/// well-known `apply_edit` id. The actual text mutation happens
/// in the document store once the client applies the edit and sends a
/// follow-up `didChange`; this core only asks.
pub(crate) fn apply_on_save(server: &mut Server, uri: &Url, text: &str) {
    let edits = compute_fixall_edits(server, uri, text);
    if edits.is_empty() {
        return;
    }

    let mut changes = std::collections::HashMap::new();
    changes.insert(uri.clone(), edits);
    let params = ApplyWorkspaceEditParams {
        label: Some("zls: fix all".to_string()),
        edit: WorkspaceEdit { changes: Some(changes), document_changes: None, change_annotations: None },
    };
    server.outbound.request(RequestId::String("apply_edit".to_string()), "workspace/applyEdit", &params);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ServerOptions;
    use crate::collaborators::{CodeActionBuilder, DocumentStore, SyntaxChecker};
    use lsp_types::{CodeAction, Diagnostic, Range};
    use std::sync::Arc;

    struct FixAllBuilder;

    impl DocumentStore for FixAllBuilder {
        fn open(&self, _uri: &Url, _text: String, _version: i32) {}
        fn change(&self, _uri: &Url, _text: String, _version: i32) {}
        fn save(&self, _uri: &Url) {}
        fn close(&self, _uri: &Url) {}
        fn text(&self, _uri: &Url) -> Option<String> {
            None
        }
    }

    impl SyntaxChecker for FixAllBuilder {
        fn check(&self, _uri: &Url, _text: &str) -> Vec<Diagnostic> {
            vec![Diagnostic::new_simple(Range::default(), "unused variable".to_string())]
        }
    }

    impl CodeActionBuilder for FixAllBuilder {
        fn build(&self, _diagnostics: &[Diagnostic], uri: &Url) -> Vec<CodeActionOrCommand> {
            let mut changes = std::collections::HashMap::new();
            changes.insert(uri.clone(), vec![TextEdit { range: Range::default(), new_text: "fixed".to_string() }]);
            let action = CodeAction {
                title: "Fix all".to_string(),
                kind: Some(CodeActionKind::SOURCE_FIX_ALL),
                diagnostics: None,
                edit: Some(WorkspaceEdit { changes: Some(changes), document_changes: None, change_annotations: None }),
                command: None,
                is_preferred: None,
                disabled: None,
                data: None,
            };
            vec![CodeActionOrCommand::CodeAction(action)]
        }
    }

    fn server_with_fixall() -> Server {
        let collaborator = Arc::new(FixAllBuilder);
        Server::with_collaborators(ServerOptions::default(), collaborator.clone(), collaborator.clone(), collaborator)
    }

    #[test]
    fn mode_is_none_when_config_disabled() {
        let server = server_with_fixall();
        assert_eq!(mode(&server), AutofixMode::None);
    }

    #[test]
    fn mode_is_none_without_apply_edit_capability() {
        let mut server = server_with_fixall();
        server.config.enable_autofix = true;
        assert_eq!(mode(&server), AutofixMode::None);
    }

    #[test]
    fn mode_prefers_will_save_wait_until_when_supported() {
        let mut server = server_with_fixall();
        server.config.enable_autofix = true;
        server.client_capabilities.apply_edits = true;
        server.client_capabilities.will_save_wait_until = true;
        assert_eq!(mode(&server), AutofixMode::WillSaveWaitUntil);
    }

    #[test]
    fn mode_falls_back_to_on_save() {
        let mut server = server_with_fixall();
        server.config.enable_autofix = true;
        server.client_capabilities.apply_edits = true;
        assert_eq!(mode(&server), AutofixMode::OnSave);
    }

    #[test]
    fn compute_fixall_edits_extracts_single_uri_match() {
        let server = server_with_fixall();
        let uri: Url = "file:///tmp/a.zig".parse().unwrap();
        let edits = compute_fixall_edits(&server, &uri, "const x = 1;");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "fixed");
    }

    #[test]
    fn apply_on_save_queues_apply_edit_request() {
        let mut server = server_with_fixall();
        let uri: Url = "file:///tmp/a.zig".parse().unwrap();
        apply_on_save(&mut server, &uri, "const x = 1;");
        let frame = server.pop_outbound().expect("expected an applyEdit request");
        let value: serde_json::Value = serde_json::from_slice(&frame).unwrap();
        assert_eq!(value["id"], "apply_edit");
        assert_eq!(value["method"], "workspace/applyEdit");
    }
}
