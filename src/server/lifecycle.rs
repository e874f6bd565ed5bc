//! Request/notification handlers that drive the lifecycle state machine:
//! `initialize`, `initialized`, `shutdown`, `exit`. The transitions
//! themselves are applied centrally by the dispatcher once a handler
//! succeeds (`Status::transition`); these handlers only compute results and
//! session-frozen state.

use lsp_types::*;
use serde_json::Value;

use crate::arena::RequestArena;
use crate::capabilities::{negotiate, OffsetEncoding};
use crate::error::DispatchError;
use crate::message::RequestId;

use super::{configuration, Server};

pub(crate) fn initialize(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<Value, DispatchError> {
    let params: InitializeParams = serde_json::from_value(params)?;
    let negotiated = negotiate(&params);

    server.client_capabilities = negotiated.capabilities;
    server.offset_encoding = negotiated.offset_encoding;
    server.tuning = negotiated.tuning;
    server.trace = server.trace || negotiated.trace_enabled;

    warn_on_toolchain_skew(server);

    let result = InitializeResult {
        capabilities: server_capabilities(negotiated.offset_encoding),
        server_info: Some(ServerInfo { name: "zls".to_string(), version: Some(env!("CARGO_PKG_VERSION").to_string()) }),
    };

    Ok(serde_json::to_value(result).unwrap_or(Value::Null))
}

/// `initialized` fires once the client has digested the `initialize`
/// response; this is when the server may start issuing its own
/// requests.
pub(crate) fn initialized(server: &mut Server, _arena: &RequestArena, _params: Value) -> Result<(), DispatchError> {
    if server.recording {
        notify_recording_active(server);
    }

    register_did_change_configuration(server);

    if server.client_capabilities.configuration_pull {
        configuration::issue_pull_request(server);
    }

    Ok(())
}

pub(crate) fn shutdown(_server: &mut Server, _arena: &RequestArena, _params: Value) -> Result<Value, DispatchError> {
    // A shutdown response with an explicit null result.
    Ok(Value::Null)
}

/// `exit` is a pure state transition here; the dispatcher applies
/// `Status::transition` after this returns `Ok`. Actually terminating the
/// process is the transport/bin entry point's job, once it observes the
/// resulting `Status` — keeping this handler process-exit-free is what makes
/// the lifecycle testable in-process.
pub(crate) fn exit(_server: &mut Server, _arena: &RequestArena, _params: Value) -> Result<(), DispatchError> {
    Ok(())
}

fn notify_recording_active(server: &mut Server) {
    let message = ShowMessageParams {
        typ: MessageType::INFO,
        message: "zls: this session is being recorded".to_string(),
    };
    server.outbound.notify("window/showMessage", &message);
}

fn warn_on_toolchain_skew(server: &mut Server) {
    let Some(toolchain_version) = server.toolchain_version.as_deref() else {
        return;
    };
    let server_version = env!("CARGO_PKG_VERSION");
    if toolchain_version != server_version {
        let message = ShowMessageParams {
            typ: MessageType::WARNING,
            message: format!(
                "zls: installed toolchain version ({toolchain_version}) does not match the server's expected version ({server_version})"
            ),
        };
        server.outbound.notify("window/showMessage", &message);
    }
}

/// Registers for `workspace/didChangeConfiguration` dynamically if the
/// client asked for dynamic registration rather than static capabilities.
fn register_did_change_configuration(server: &mut Server) {
    if !server.client_capabilities.did_change_configuration_dynamic_registration {
        return;
    }
    let method = "workspace/didChangeConfiguration";
    let params = RegistrationParams {
        registrations: vec![Registration { id: method.to_string(), method: method.to_string(), register_options: None }],
    };
    server.outbound.request(RequestId::String(format!("register-{method}")), "client/registerCapability", &params);
}

/// The server's fixed capability set: signature help, incremental
/// sync, completion triggers, and the full complement of navigation,
/// editing, and presentation features this spec names.
fn server_capabilities(offset_encoding: OffsetEncoding) -> ServerCapabilities {
    ServerCapabilities {
        position_encoding: Some(offset_encoding.as_lsp()),
        text_document_sync: Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
            open_close: Some(true),
            change: Some(TextDocumentSyncKind::INCREMENTAL),
            will_save: Some(true),
            will_save_wait_until: Some(true),
            save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions { include_text: Some(false) })),
        })),
        signature_help_provider: Some(SignatureHelpOptions {
            trigger_characters: Some(vec!["(".to_string(), ",".to_string()]),
            retrigger_characters: None,
            work_done_progress_options: Default::default(),
        }),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(
                [".", ":", "@", "]", "/"].iter().map(|s| s.to_string()).collect(),
            ),
            ..Default::default()
        }),
        rename_provider: Some(OneOf::Left(true)),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
        declaration_provider: Some(DeclarationCapability::Simple(true)),
        definition_provider: Some(OneOf::Left(true)),
        type_definition_provider: Some(TypeDefinitionProviderCapability::Simple(true)),
        implementation_provider: Some(ImplementationProviderCapability::Simple(true)),
        references_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        document_formatting_provider: Some(OneOf::Left(true)),
        folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
        selection_range_provider: Some(SelectionRangeProviderCapability::Simple(true)),
        document_highlight_provider: Some(OneOf::Left(true)),
        inlay_hint_provider: Some(OneOf::Left(true)),
        semantic_tokens_provider: Some(SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
            work_done_progress_options: Default::default(),
            legend: SemanticTokensLegend {
                token_types: SEMANTIC_TOKEN_TYPES.to_vec(),
                token_modifiers: SEMANTIC_TOKEN_MODIFIERS.to_vec(),
            },
            range: Some(true),
            full: Some(SemanticTokensFullOptions::Bool(true)),
        })),
        ..Default::default()
    }
}

/// Fixed token-type legend for `textDocument/semanticTokens/*`.
static SEMANTIC_TOKEN_TYPES: &[SemanticTokenType] = &[
    SemanticTokenType::NAMESPACE,
    SemanticTokenType::TYPE,
    SemanticTokenType::CLASS,
    SemanticTokenType::ENUM,
    SemanticTokenType::INTERFACE,
    SemanticTokenType::STRUCT,
    SemanticTokenType::TYPE_PARAMETER,
    SemanticTokenType::PARAMETER,
    SemanticTokenType::VARIABLE,
    SemanticTokenType::PROPERTY,
    SemanticTokenType::ENUM_MEMBER,
    SemanticTokenType::FUNCTION,
    SemanticTokenType::MACRO,
    SemanticTokenType::KEYWORD,
    SemanticTokenType::MODIFIER,
    SemanticTokenType::COMMENT,
    SemanticTokenType::STRING,
    SemanticTokenType::NUMBER,
    SemanticTokenType::OPERATOR,
];

/// Fixed token-modifier legend for `textDocument/semanticTokens/*`.
static SEMANTIC_TOKEN_MODIFIERS: &[SemanticTokenModifier] = &[
    SemanticTokenModifier::DECLARATION,
    SemanticTokenModifier::DEFINITION,
    SemanticTokenModifier::READONLY,
    SemanticTokenModifier::STATIC,
    SemanticTokenModifier::DEPRECATED,
    SemanticTokenModifier::DOCUMENTATION,
];
