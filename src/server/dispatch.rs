//! The dispatcher: decodes a raw frame, routes it down the request,
//! notification, or response path, and translates handler outcomes into
//! outbound frames or log lines.

use std::time::Instant;

use serde_json::Value;

use crate::error::DispatchError;
use crate::message::{Message, RequestId, ResponseError};
use crate::status::Gate;

use super::configuration;
use super::handlers;
use super::Server;

/// Entry point: decode `bytes` into a `Message` and route the result.
pub(crate) fn handle_message(server: &mut Server, bytes: &[u8]) {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("dropping unparsable frame: {e}");
            return;
        }
    };

    let message = match Message::decode(value) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("dropping malformed message: {e}");
            return;
        }
    };

    match message {
        Message::Response { id, result, error } => handle_response(server, id, result, error),
        Message::Request { id, method, params } => handle_request(server, id, method, params),
        Message::Notification { method, params } => handle_notification(server, method, params),
    }
}

fn handle_request(server: &mut Server, id: RequestId, method: String, params: Value) {
    let start = Instant::now();

    match server.status.gate(&method) {
        Gate::NotInitialized => {
            server.outbound.respond_err(id, ResponseError::from_taxonomy(&DispatchError::ServerNotInitialized));
            return;
        }
        Gate::InvalidRequest => {
            server.outbound.respond_err(id, ResponseError::from_taxonomy(&DispatchError::InvalidRequest));
            return;
        }
        Gate::Allow => {}
    }

    let Some(entry) = handlers::find_request(&method) else {
        server.outbound.respond_err(id, ResponseError::from_taxonomy(&DispatchError::MethodNotFound));
        return;
    };

    let arena = crate::arena::RequestArena::new();
    match (entry.invoke)(server, &arena, params) {
        Ok(value) => {
            server.outbound.respond_ok(id, &value);
            if let Some(next) = server.status.transition(&method) {
                server.status = next;
            }
        }
        Err(err) => {
            if err.is_protocol_visible() {
                server.outbound.respond_err(id, ResponseError::from_taxonomy(&err));
            } else {
                log::error!("{method} failed with a transport-internal error: {err}");
            }
        }
    }

    log_elapsed(&method, start);
}

fn handle_notification(server: &mut Server, method: String, params: Value) {
    let start = Instant::now();

    match server.status.gate(&method) {
        Gate::NotInitialized | Gate::InvalidRequest => {
            log::debug!("dropping {method} notification: lifecycle gate refused it");
            return;
        }
        Gate::Allow => {}
    }

    let Some(entry) = handlers::find_notification(&method) else {
        log::debug!("unknown notification method {method}; dropping");
        return;
    };

    let arena = crate::arena::RequestArena::new();
    match (entry.invoke)(server, &arena, params) {
        Ok(()) => {
            if let Some(next) = server.status.transition(&method) {
                server.status = next;
            }
        }
        Err(err) => log::debug!("{method} notification failed: {err}"),
    }

    log_elapsed(&method, start);
}

/// Responses are correlated only by well-known id prefixes;
/// everything else is logged and dropped.
fn handle_response(server: &mut Server, id: RequestId, result: Option<Value>, error: Option<ResponseError>) {
    let Some(id_str) = id.as_str() else {
        log::warn!("dropping response with unmatched numeric id {id}");
        return;
    };

    if id_str.starts_with("register-") {
        if let Some(err) = error {
            log::warn!("client rejected capability registration {id_str:?}: {} ({})", err.message, err.code);
        }
        return;
    }

    if id_str == "apply_edit" {
        if let Some(err) = error {
            log::warn!("client rejected workspace/applyEdit: {} ({})", err.message, err.code);
        }
        return;
    }

    if id_str == crate::config::PULL_REQUEST_ID {
        configuration::handle_pull_response(server, result, error);
        return;
    }

    log::warn!("dropping unmatched response id {id_str:?}");
}

fn log_elapsed(method: &str, start: Instant) {
    if cfg!(test) {
        return;
    }
    log::debug!("{method} handled in {:?}", start.elapsed());
}
