//! Human-readable error chains.

use crate::error_chain::{ErrorNode, MAX_CHAIN_DEPTH};
use chrono::SecondsFormat;

const INDENT: &str = "  ";

/// Render a chain outermost first, each cause two spaces deeper than the last.
///
/// ```text
/// ErrorRPCRemote: Remote error from RPC call - denied
///   nodeId	v0ab...
///   ...
///   cause: ErrorClientAuthDenied: Authorization denied
/// ```
pub fn render_error_chain(root: &ErrorNode) -> String {
    let mut out = String::new();
    let mut indent = INDENT.to_string();
    let mut current = Some(root);
    let mut depth = 0;
    while let Some(node) = current {
        if depth == MAX_CHAIN_DEPTH {
            out.push_str("...\n");
            break;
        }
        depth += 1;
        match node {
            ErrorNode::Remote(e) => {
                push_heading(&mut out, &e.name, &e.description, &e.message);
                let port = e.port.to_string();
                let timestamp = e.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
                for (key, value) in [
                    ("nodeId", e.node_id.as_str()),
                    ("host", e.host.as_str()),
                    ("port", port.as_str()),
                    ("command", e.command.as_str()),
                    ("timestamp", timestamp.as_str()),
                ] {
                    out.push_str(&format!("{}{}\t{}\n", indent, key, value));
                }
                for (key, value) in &e.metadata {
                    out.push_str(&format!("{}{}\t{}\n", indent, key, value));
                }
            }
            ErrorNode::Domain(e) => {
                push_heading(&mut out, &e.name, &e.description, &e.message);
                if !e.data.is_empty() {
                    let data = serde_json::Value::Object(e.data.clone());
                    out.push_str(&format!("{}data\t{}\n", indent, data));
                }
            }
            ErrorNode::Foreign(e) => {
                out.push_str(&format!("{}: {}\n", e.name, e.message));
                break;
            }
        }
        current = node.cause();
        if current.is_some() {
            out.push_str(&format!("{}cause: ", indent));
            indent.push_str(INDENT);
        }
    }
    out
}

fn push_heading(out: &mut String, name: &str, description: &str, message: &str) {
    out.push_str(name);
    if !description.is_empty() {
        out.push_str(": ");
        out.push_str(description);
    }
    if !message.is_empty() {
        out.push_str(" - ");
        out.push_str(message);
    }
    out.push('\n');
}
