//! The native HTTP transport against an in-process JSON-RPC server.

#![cfg(not(target_arch = "wasm32"))]

use axum::{http::StatusCode, routing::post, Json, Router};
use dozer_core::rpc::{PendingCall, RpcResult, METHOD_NOT_FOUND, TRANSPORT_FAILURE};
use dozer_core::transport::HttpTransport;
use dozer_core::{Api, ErrorKind, MicronVec, NoteId, RpcClient};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

async fn handle(Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let params = &request["params"];
    let response = match request["method"].as_str() {
        Some("dozer.create_note") => json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "class": "Note",
                "node_id": 7,
                "name": "3f2a",
                "full_name": format!("{}/3f2a", params["notepage_name"].as_str().unwrap_or("")),
                "pos_um": params.get("pos_um").cloned().unwrap_or(json!([0, 0])),
                "size_um": [1000, 1000],
                "z_index": 0,
                "contents_markdown": "",
                "revision_id": 1,
            },
        }),
        Some("echo") => json!({"jsonrpc": "2.0", "id": id, "result": params}),
        Some("misrouted") => json!({"jsonrpc": "2.0", "id": "someone_else_0", "result": 1}),
        _ => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": METHOD_NOT_FOUND, "message": "Method not found"},
        }),
    };
    Json(response)
}

fn app() -> Router {
    Router::new()
        .route("/jsonrpc", post(handle))
        .route("/broken", post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
        .route("/garbage", post(|| async { "<html>not json</html>" }))
}

fn spawn_server() -> SocketAddr {
    let (tx, rx) = std::sync::mpsc::channel();
    thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app()).await.unwrap();
        });
    });
    rx.recv().unwrap()
}

fn client_for(addr: SocketAddr, path: &str) -> RpcClient<HttpTransport> {
    let _ = env_logger::builder().is_test(true).try_init();
    let transport = HttpTransport::new(&format!("http://{addr}{path}")).unwrap();
    RpcClient::new(transport, Some(Duration::from_secs(10)))
}

/// Pump until `call` resolves.
fn wait(client: &mut RpcClient<HttpTransport>, call: &mut PendingCall) -> RpcResult<Value> {
    for _ in 0..500 {
        client.pump();
        if let Some(result) = call.try_take() {
            return result;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("call {} never resolved", call.id());
}

#[test]
fn test_round_trip() {
    let addr = spawn_server();
    let mut client = client_for(addr, "/jsonrpc");
    let mut call = client.call("echo", json!({"a": [1, 2, 3]})).unwrap();
    assert_eq!(wait(&mut client, &mut call), Ok(json!({"a": [1, 2, 3]})));
    assert_eq!(client.outstanding(), 0);
}

#[test]
fn test_typed_create_note() {
    let addr = spawn_server();
    let mut client = client_for(addr, "/jsonrpc");
    let call = Api::default()
        .create_note(&mut client, "/page1", Some(MicronVec::new(500, 250)), None)
        .unwrap();
    let mut inner = call.into_inner();
    let value = wait(&mut client, &mut inner).unwrap();
    let note: dozer_core::Note = serde_json::from_value(value).unwrap();
    assert_eq!(note.id, NoteId(7));
    assert_eq!(note.pos_um, MicronVec::new(500, 250));
}

#[test]
fn test_many_calls_in_flight() {
    let addr = spawn_server();
    let mut client = client_for(addr, "/jsonrpc");
    let mut calls: Vec<_> = (0..8).map(|n| client.call("echo", json!({"n": n})).unwrap()).collect();
    for (n, call) in calls.iter_mut().enumerate() {
        assert_eq!(wait(&mut client, call), Ok(json!({"n": n})));
    }
}

#[test]
fn test_application_error_passes_through() {
    let addr = spawn_server();
    let mut client = client_for(addr, "/jsonrpc");
    let mut call = client.call("dozer.frobnicate", json!({})).unwrap();
    let err = wait(&mut client, &mut call).unwrap_err();
    assert_eq!(err.code, METHOD_NOT_FOUND);
    assert_eq!(err.message, "Method not found");
}

#[test]
fn test_misrouted_response_is_protocol_error() {
    let addr = spawn_server();
    let mut client = client_for(addr, "/jsonrpc");
    let mut call = client.call("misrouted", json!({})).unwrap();
    let err = wait(&mut client, &mut call).unwrap_err();
    assert_eq!(err.message, "id mismatch");
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[test]
fn test_http_status_is_transport_failure() {
    let addr = spawn_server();
    let mut client = client_for(addr, "/broken");
    let mut call = client.call("echo", json!({})).unwrap();
    let err = wait(&mut client, &mut call).unwrap_err();
    assert_eq!(err.code, TRANSPORT_FAILURE);
    assert_eq!(err.data, Some(json!(500)));
}

#[test]
fn test_unparseable_body_is_transport_failure() {
    let addr = spawn_server();
    let mut client = client_for(addr, "/garbage");
    let mut call = client.call("echo", json!({})).unwrap();
    let err = wait(&mut client, &mut call).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.data, Some(json!(200)));
}

#[test]
fn test_connection_refused_is_transport_failure() {
    // Bind and drop to find a port nobody listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let mut client = client_for(addr, "/jsonrpc");
    let mut call = client.call("echo", json!({})).unwrap();
    let err = wait(&mut client, &mut call).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}
