//! End-to-end tests of the nodectl binary against a stub agent.

use serde_json::{json, Value};
use tempfile::TempDir;

use crate::integration::test_utils::{
    domain_error_json, nodectl, rpc_error, rpc_result, write_live_status, write_status,
    StubAgent, NODE_ID,
};

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_status_without_agent_is_dead() {
    let temp = TempDir::new().unwrap();
    let output = nodectl(&temp).args(["agent", "status"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr={}", stderr(&output));
    assert_eq!(stdout(&output), "status\t\"DEAD\"\n");
}

#[test]
fn test_status_json_format() {
    let temp = TempDir::new().unwrap();
    write_status(&temp.path().join("node"), &json!({"status": "STARTING"}));
    let output = nodectl(&temp)
        .args(["--format", "json", "agent", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "{\"status\":\"STARTING\"}\n");
}

#[test]
fn test_malformed_status_file_reads_as_dead() {
    let temp = TempDir::new().unwrap();
    let node = temp.path().join("node");
    std::fs::create_dir_all(&node).unwrap();
    std::fs::write(node.join("status.json"), "{ not json").unwrap();
    let output = nodectl(&temp).args(["agent", "status"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "status\t\"DEAD\"\n");
}

#[test]
fn test_live_status_queries_agent() {
    let temp = TempDir::new().unwrap();
    let agent = StubAgent::spawn(vec![rpc_result(json!({"pid": 4242, "version": "1.0.0"}))]);
    write_live_status(&temp.path().join("node"), agent.port);

    let output = nodectl(&temp).args(["agent", "status"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr={}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "status \t\"LIVE\"\npid    \t4242\nversion\t\"1.0.0\"\n"
    );

    let requests = agent.finish();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/rpc");
    assert_eq!(requests[0].method(), "agentStatus");
    assert_eq!(requests[0].authorization, None);
}

#[test]
fn test_partial_connection_flags_are_usage_error() {
    let temp = TempDir::new().unwrap();
    let output = nodectl(&temp)
        .args(["--node-id", NODE_ID, "agent", "stop"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(64));
    let err = stderr(&output);
    assert!(err.starts_with("ErrorCLIClientOptions"), "stderr={}", err);
    assert!(err.contains(
        "missing client host, provide it with --client-host or NODECTL_CLIENT_HOST; \
         missing client port, provide it with --client-port or NODECTL_CLIENT_PORT"
    ));
    assert!(!err.contains("missing node ID"));
}

#[test]
fn test_partial_connection_env_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let output = nodectl(&temp)
        .env("NODECTL_CLIENT_PORT", "1314")
        .args(["agent", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(64));
    let err = stderr(&output);
    assert!(err.contains("missing node ID, provide it with --node-id or NODECTL_NODE_ID"));
    assert!(err.contains("missing client host"));
    assert!(!err.contains("missing client port"));
}

#[test]
fn test_stop_without_live_agent_is_temporary_failure() {
    let temp = TempDir::new().unwrap();
    let output = nodectl(&temp).args(["agent", "stop"]).output().unwrap();
    assert_eq!(output.status.code(), Some(75));
    assert!(stderr(&output).starts_with("ErrorCLIAgentStatus"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_unreadable_password_file_is_no_input() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent-password");
    let output = nodectl(&temp)
        .args(["--node-id", NODE_ID, "--client-host", "127.0.0.1", "--client-port", "1"])
        .arg("--password-file")
        .arg(&missing)
        .args(["--format", "json", "call", "vaultsList"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(66));
    let err: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["type"], "ErrorCLIPasswordFileRead");
    assert_eq!(err["data"]["exitCode"], 66);
    assert_eq!(err["data"]["data"]["syscall"], "open");
    assert_eq!(err["data"]["data"]["errno"], 2);
    assert_eq!(
        err["data"]["data"]["path"],
        json!(missing.display().to_string())
    );
}

#[test]
fn test_invalid_node_id_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let output = nodectl(&temp)
        .args(["--node-id", "node-1", "--client-host", "h", "--client-port", "1"])
        .args(["agent", "stop"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(64));
    assert!(stderr(&output).starts_with("ErrorCLINodeId"));
}

#[test]
fn test_argument_errors_exit_64_and_help_exits_0() {
    let temp = TempDir::new().unwrap();
    let output = nodectl(&temp).args(["agent", "bogus"]).output().unwrap();
    assert_eq!(output.status.code(), Some(64));

    let output = nodectl(&temp).arg("--help").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("agent"));
}

#[test]
fn test_unattended_denied_fails_without_prompt() {
    let temp = TempDir::new().unwrap();
    let agent = StubAgent::spawn(vec![rpc_error(domain_error_json(
        "ErrorClientAuthDenied",
        "bad password",
        77,
    ))]);
    write_live_status(&temp.path().join("node"), agent.port);

    let output = nodectl(&temp)
        .env("NODECTL_PASSWORD", "pw")
        .args(["call", "vaultsList"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(77));
    let err = stderr(&output);
    assert!(
        err.starts_with("ErrorRPCRemote: Remote error from RPC call - bad password\n"),
        "stderr={}",
        err
    );
    assert!(err.contains("  command\tvaultsList\n"));
    assert!(err.contains("  cause: ErrorClientAuthDenied: Agent error - bad password\n"));

    let requests = agent.finish();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization.as_deref(), Some("Basic OnB3"));
}

#[test]
fn test_auth_missing_without_terminal_is_password_missing() {
    let temp = TempDir::new().unwrap();
    let agent = StubAgent::spawn(vec![rpc_error(domain_error_json(
        "ErrorClientAuthMissing",
        "authorization required",
        77,
    ))]);
    write_live_status(&temp.path().join("node"), agent.port);

    let output = nodectl(&temp).args(["agent", "stop"]).output().unwrap();
    assert_eq!(output.status.code(), Some(64));
    assert_eq!(
        stderr(&output),
        "ErrorCLIPasswordMissing: Password is necessary\n"
    );
    assert_eq!(agent.finish().len(), 1);
}

#[test]
fn test_token_is_sent_as_bearer() {
    let temp = TempDir::new().unwrap();
    let agent = StubAgent::spawn(vec![rpc_result(Value::Null)]);
    write_live_status(&temp.path().join("node"), agent.port);

    let output = nodectl(&temp)
        .env("NODECTL_TOKEN", "session-token")
        .args(["agent", "stop"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr={}", stderr(&output));
    assert!(stdout(&output).is_empty());

    let requests = agent.finish();
    assert_eq!(requests[0].method(), "agentStop");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer session-token")
    );
}

#[test]
fn test_password_change_sends_new_password() {
    let temp = TempDir::new().unwrap();
    let password_file = temp.path().join("password");
    std::fs::write(&password_file, "old\n").unwrap();
    let agent = StubAgent::spawn(vec![rpc_result(Value::Null)]);
    write_live_status(&temp.path().join("node"), agent.port);

    let output = nodectl(&temp)
        .env("NODECTL_PASSWORD_NEW", "new")
        .arg("--password-file")
        .arg(&password_file)
        .args(["keys", "password"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr={}", stderr(&output));

    let requests = agent.finish();
    assert_eq!(requests[0].method(), "keysPasswordChange");
    assert_eq!(requests[0].body["params"], json!({"password": "new"}));
    assert_eq!(requests[0].authorization.as_deref(), Some("Basic Om9sZA=="));
}

#[test]
fn test_call_renders_table_with_explicit_coordinates() {
    let temp = TempDir::new().unwrap();
    let agent = StubAgent::spawn(vec![rpc_result(json!([
        {"id": 1, "name": "a"},
        {"id": 2}
    ]))]);
    let port = agent.port.to_string();

    let output = nodectl(&temp)
        .args(["--node-id", NODE_ID, "--client-host", "127.0.0.1", "--client-port"])
        .arg(&port)
        .args(["call", "vaultsList", "--params", "{\"limit\":2}"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr={}", stderr(&output));
    assert_eq!(stdout(&output), "id \tname\n1  \ta   \n2  \tN/A \n");

    let requests = agent.finish();
    assert_eq!(requests[0].method(), "vaultsList");
    assert_eq!(requests[0].body["params"], json!({"limit": 2}));
    assert_eq!(requests[0].body["jsonrpc"], "2.0");
}
