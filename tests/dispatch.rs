//! End-to-end integration tests: feed raw JSON-RPC text through a `Server`
//! and inspect what lands on its outbound queue, the way a real transport
//! would observe it.

use std::sync::Arc;

use anyhow::Result;
use lsp_dispatch::collaborators::NullCollaborators;
use lsp_dispatch::server::{Server, ServerOptions};
use lsp_dispatch::Status;
use serde_json::{json, Value};

fn server() -> Server {
    Server::with_collaborators(
        ServerOptions::default(),
        Arc::new(NullCollaborators),
        Arc::new(NullCollaborators),
        Arc::new(NullCollaborators),
    )
}

fn feed(server: &mut Server, message: Value) {
    server.handle_message(message.to_string().as_bytes());
}

fn pop(server: &mut Server) -> Result<Value> {
    let frame = server.pop_outbound().ok_or_else(|| anyhow::anyhow!("expected a queued outbound frame"))?;
    Ok(serde_json::from_slice(&frame)?)
}

#[test]
fn lifecycle_happy_path_end_to_end() -> Result<()> {
    let mut server = server();

    feed(&mut server, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"capabilities": {}}}));
    let response = pop(&mut server)?;
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["serverInfo"]["name"], "zls");
    assert_eq!(server.status(), Status::Initializing);

    feed(&mut server, json!({"jsonrpc": "2.0", "method": "initialized", "params": {}}));
    assert!(server.pop_outbound().is_none());
    assert_eq!(server.status(), Status::Initialized);

    feed(&mut server, json!({"jsonrpc": "2.0", "id": 2, "method": "shutdown"}));
    let response = pop(&mut server)?;
    assert_eq!(response["id"], 2);
    assert!(response["result"].is_null());
    assert_eq!(server.status(), Status::Shutdown);

    feed(&mut server, json!({"jsonrpc": "2.0", "method": "exit"}));
    assert_eq!(server.status(), Status::ExitingSuccess);
    Ok(())
}

#[test]
fn request_before_initialize_is_rejected() -> Result<()> {
    let mut server = server();
    feed(&mut server, json!({"jsonrpc": "2.0", "id": 7, "method": "textDocument/hover", "params": {}}));
    let response = pop(&mut server)?;
    assert_eq!(response["id"], 7);
    assert_eq!(response["error"]["code"], -32002);
    Ok(())
}

#[test]
fn unknown_method_is_method_not_found() -> Result<()> {
    let mut server = server();
    feed(&mut server, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"capabilities": {}}}));
    server.pop_outbound();
    feed(&mut server, json!({"jsonrpc": "2.0", "method": "initialized", "params": {}}));

    feed(&mut server, json!({"jsonrpc": "2.0", "id": 9, "method": "textDocument/banana"}));
    let response = pop(&mut server)?;
    assert_eq!(response["id"], 9);
    assert_eq!(response["error"]["code"], -32601);
    Ok(())
}

#[test]
fn offset_encoding_negotiation_prefers_utf8() -> Result<()> {
    let mut server = server();
    feed(
        &mut server,
        json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"capabilities": {"general": {"positionEncodings": ["utf-8", "utf-16"]}}},
        }),
    );
    let response = pop(&mut server)?;
    assert_eq!(response["result"]["capabilities"]["positionEncoding"], "utf-8");
    Ok(())
}

#[test]
fn offset_encoding_negotiation_falls_back_to_utf16() -> Result<()> {
    let mut server = server();
    feed(
        &mut server,
        json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"capabilities": {"general": {"positionEncodings": []}}},
        }),
    );
    let response = pop(&mut server)?;
    assert_eq!(response["result"]["capabilities"]["positionEncoding"], "utf-16");
    Ok(())
}

#[test]
fn configuration_pull_request_enumerates_every_zls_option() -> Result<()> {
    let mut server = server();
    feed(
        &mut server,
        json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"capabilities": {"workspace": {"configuration": true}}},
        }),
    );
    server.pop_outbound();
    feed(&mut server, json!({"jsonrpc": "2.0", "method": "initialized", "params": {}}));

    let request = pop(&mut server)?;
    assert_eq!(request["id"], "i_haz_configuration");
    assert_eq!(request["method"], "workspace/configuration");
    let items = request["params"]["items"].as_array().expect("items array");
    assert!(!items.is_empty());
    assert!(items.iter().all(|i| i["section"].as_str().unwrap().starts_with("zls.")));
    Ok(())
}

#[test]
fn configuration_pull_response_with_mistyped_value_keeps_previous() -> Result<()> {
    let mut server = server();
    feed(
        &mut server,
        json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"capabilities": {"workspace": {"configuration": true}}},
        }),
    );
    server.pop_outbound();
    feed(&mut server, json!({"jsonrpc": "2.0", "method": "initialized", "params": {}}));
    let request = pop(&mut server)?;
    let item_count = request["params"]["items"].as_array().unwrap().len();

    let before = server.config().clone();
    let mut values = vec![Value::Null; item_count];
    values[0] = json!(true); // zls.zigExePath expects a string; this is a type mismatch.
    feed(
        &mut server,
        json!({"jsonrpc": "2.0", "id": "i_haz_configuration", "result": values}),
    );
    assert_eq!(*server.config(), before);
    Ok(())
}

#[test]
fn response_round_trips_through_decode_and_wire_writer() -> Result<()> {
    use lsp_dispatch::{Message, OutboundQueue, RequestId};

    let original = Message::decode_str(r#"{"jsonrpc":"2.0","id":3,"method":"shutdown"}"#)?;
    let Message::Request { id, method, params } = original.clone() else {
        anyhow::bail!("expected a request");
    };

    let mut queue = OutboundQueue::new();
    queue.request(RequestId::Number(3), "shutdown", &params);
    let frame = queue.pop_front().expect("one frame queued");
    let reparsed: Value = serde_json::from_slice(&frame)?;
    assert_eq!(reparsed["id"], 3);
    assert_eq!(reparsed["method"], method);
    assert_eq!(id, RequestId::Number(3));
    Ok(())
}
