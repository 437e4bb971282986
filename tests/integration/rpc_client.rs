//! JSON-RPC transport against a stub agent.

use nodectl::auth::AuthMetadata;
use nodectl::connection::{ConnectionParameters, NodeId};
use nodectl::error::CliError;
use nodectl::error_chain::{AuthFailure, ErrorNode};
use nodectl::rpc::{JsonRpcClient, RemoteCall, RpcConfig};
use serde_json::{json, Value};

use crate::integration::test_utils::{
    domain_error_json, rpc_error, rpc_result, StubAgent, NODE_ID,
};

fn client(port: u16) -> JsonRpcClient {
    let params = ConnectionParameters {
        node_id: NODE_ID.parse::<NodeId>().unwrap(),
        host: "127.0.0.1".to_string(),
        port,
    };
    JsonRpcClient::new(params, &RpcConfig::default()).unwrap()
}

#[tokio::test]
async fn test_result_and_headers() {
    let agent = StubAgent::spawn(vec![rpc_result(json!({"ok": true})), rpc_result(Value::Null)]);
    let client = client(agent.port);
    assert_eq!(client.url(), format!("http://127.0.0.1:{}/rpc", agent.port));

    let result = client
        .call("agentStatus", &AuthMetadata::from_password("abc"), json!({}))
        .await
        .unwrap();
    assert_eq!(result, json!({"ok": true}));
    let result = client
        .call("agentStop", &AuthMetadata::none(), json!({"force": true}))
        .await
        .unwrap();
    assert_eq!(result, Value::Null);

    let requests = agent.finish();
    assert_eq!(requests[0].authorization.as_deref(), Some("Basic OmFiYw=="));
    assert_eq!(requests[1].authorization, None);
    assert_eq!(requests[1].body["params"], json!({"force": true}));
    assert_ne!(requests[0].body["id"], requests[1].body["id"]);
}

#[tokio::test]
async fn test_error_data_is_wrapped_as_remote() {
    let agent = StubAgent::spawn(vec![rpc_error(domain_error_json(
        "ErrorClientAuthMissing",
        "no credential",
        77,
    ))]);
    let err = client(agent.port)
        .call("vaultsList", &AuthMetadata::none(), json!({}))
        .await
        .unwrap_err();
    agent.finish();

    let CliError::Remote(ErrorNode::Remote(remote)) = &err else {
        panic!("expected remote error, got {:?}", err);
    };
    assert_eq!(remote.node_id, NODE_ID);
    assert_eq!(remote.host, "127.0.0.1");
    assert_eq!(remote.command, "vaultsList");
    assert_eq!(remote.message, "no credential");
    let CliError::Remote(node) = &err else {
        unreachable!()
    };
    assert_eq!(node.innermost().name(), "ErrorClientAuthMissing");
    assert_eq!(node.classify_auth(), AuthFailure::Missing);
    assert_eq!(err.exit_code(), 77);
}

#[tokio::test]
async fn test_bare_rpc_error_is_foreign() {
    let agent = StubAgent::spawn(vec![
        json!({"error": {"code": -32601, "message": "Method not found"}}),
    ]);
    let err = client(agent.port)
        .call("nope", &AuthMetadata::none(), json!({}))
        .await
        .unwrap_err();
    agent.finish();

    let CliError::Remote(node) = &err else {
        panic!("expected remote error, got {:?}", err);
    };
    let inner = node.innermost();
    assert!(matches!(inner, ErrorNode::Foreign(_)));
    assert!(inner.message().contains("Method not found"));
    assert_eq!(err.exit_code(), 255);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let err = client(port)
        .call("agentStatus", &AuthMetadata::none(), json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::Transport(_)), "got {:?}", err);
    assert_eq!(err.exit_code(), 75);
}
