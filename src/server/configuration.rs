//! The configuration subsystem's dispatch-facing half: issuing the
//! `workspace/configuration` pull request, applying its response, and
//! handling the `workspace/didChangeConfiguration` push notification.
//! Type coercion itself lives in [`crate::config`]; this module is just the
//! wiring between the wire protocol and that table.

use lsp_types::ConfigurationParams;
use serde_json::Value;

use crate::arena::RequestArena;
use crate::config::{Config, ConfigUpdateReport, PULL_REQUEST_ID};
use crate::error::DispatchError;
use crate::message::{RequestId, ResponseError};

use super::Server;

/// Issues the `workspace/configuration` pull request, unless
/// recording mode disables it to keep the session deterministic on replay.
pub(crate) fn issue_pull_request(server: &mut Server) {
    if server.recording {
        log::debug!("recording session: skipping workspace/configuration pull");
        return;
    }
    let params = ConfigurationParams { items: Config::pull_request_items() };
    server.outbound.request(RequestId::String(PULL_REQUEST_ID.to_string()), "workspace/configuration", &params);
}

/// Applies the client's answer to a previously issued pull request.
/// `result` is expected to be a JSON array ordered to match the request's
/// item list; anything else is logged and ignored.
pub(crate) fn handle_pull_response(server: &mut Server, result: Option<Value>, error: Option<ResponseError>) {
    if let Some(err) = error {
        log::warn!("workspace/configuration request failed: {} ({})", err.message, err.code);
        return;
    }
    if server.replay {
        log::debug!("replay session: ignoring workspace/configuration response");
        return;
    }
    let Some(Value::Array(values)) = result else {
        log::warn!("workspace/configuration response was not an array; ignoring");
        return;
    };
    let report = server.config.apply_pull_response(values);
    apply_report(server, report);
}

/// Handles `workspace/didChangeConfiguration`: a
/// non-null `settings` is merged as a full override; a null `settings`
/// re-issues the pull request if the client supports it.
pub(crate) fn did_change_configuration(server: &mut Server, _arena: &RequestArena, params: Value) -> Result<(), DispatchError> {
    #[derive(serde::Deserialize)]
    struct DidChangeConfigurationParams {
        settings: Value,
    }

    let params: DidChangeConfigurationParams = serde_json::from_value(params)?;

    if server.replay {
        log::debug!("replay session: ignoring workspace/didChangeConfiguration");
        return Ok(());
    }

    if params.settings.is_null() {
        if server.client_capabilities.configuration_pull {
            issue_pull_request(server);
        }
        return Ok(());
    }

    let report = server.config.apply_push(&params.settings);
    apply_report(server, report);
    Ok(())
}

/// Shared tail of both the pull and push paths. The hook and the cache itself live in the document
/// store and external configuration module, both out of scope; this
/// core only logs the conditions that would drive them.
fn apply_report(_server: &mut Server, report: ConfigUpdateReport) {
    for warning in &report.warnings {
        log::warn!("configuration option {} rejected: {}", warning.key, warning.reason);
    }
    if report.toolchain_path_changed {
        log::debug!("zig toolchain path changed; document store build-file cache should be invalidated");
    }
    if report.changed {
        log::debug!("configChanged hook: configuration updated");
    }
}
