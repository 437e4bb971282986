//! Error chains reported by the agent.
//!
//! A failed remote call surfaces as a chain of heterogeneous nodes linked by
//! `cause`: remote-call wrappers added at each RPC hop, domain errors raised by
//! the agent library, and opaque foreign errors that end the chain. The chain
//! is immutable once built; every traversal is bounded by [`MAX_CHAIN_DEPTH`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use std::fmt;

/// Upper bound on cause links followed by any traversal or decode.
pub const MAX_CHAIN_DEPTH: usize = 64;

/// Domain error raised when a call carried no authorization.
pub const AUTH_MISSING: &str = "ErrorClientAuthMissing";
/// Domain error raised when the supplied authorization was rejected.
pub const AUTH_DENIED: &str = "ErrorClientAuthDenied";

/// Name used for remote-call wrapper nodes.
pub const REMOTE_ERROR_NAME: &str = "ErrorRPCRemote";
const REMOTE_ERROR_DESCRIPTION: &str = "Remote error from RPC call";

/// Metadata keys decoded into [`RemoteError`]'s typed fields.
const REMOTE_METADATA_KEYS: [&str; 4] = ["nodeId", "host", "port", "command"];

/// Exit status used when no node in a chain carries one.
pub const UNCLASSIFIED_EXIT_CODE: i32 = 255;

/// One node of an error chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorNode {
    Remote(RemoteError),
    Domain(DomainError),
    Foreign(ForeignError),
}

/// Wrapper recording which peer and command an error crossed.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    pub name: String,
    pub description: String,
    pub message: String,
    pub node_id: String,
    pub host: String,
    pub port: u16,
    pub command: String,
    pub timestamp: DateTime<Utc>,
    /// Metadata keys beyond the peer coordinates, kept in wire order.
    pub metadata: Map<String, Value>,
    pub cause: Option<Box<ErrorNode>>,
}

/// Error from the agent's own error family.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainError {
    pub name: String,
    pub description: String,
    pub message: String,
    pub exit_code: i32,
    pub data: Map<String, Value>,
    pub cause: Option<Box<ErrorNode>>,
}

/// Anything outside the domain family. Traversal stops here.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignError {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

/// Outcome of inspecting a failure for authentication problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    Missing,
    Denied,
    Other,
}

impl RemoteError {
    /// Wrap `cause` as having come back from `command` on the given peer.
    pub fn wrap(
        cause: ErrorNode,
        node_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        command: impl Into<String>,
    ) -> Self {
        let message = cause.message().to_string();
        Self {
            name: REMOTE_ERROR_NAME.to_string(),
            description: REMOTE_ERROR_DESCRIPTION.to_string(),
            message,
            node_id: node_id.into(),
            host: host.into(),
            port,
            command: command.into(),
            timestamp: Utc::now(),
            metadata: Map::new(),
            cause: Some(Box::new(cause)),
        }
    }
}

impl DomainError {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        message: impl Into<String>,
        exit_code: i32,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            message: message.into(),
            exit_code,
            data: Map::new(),
            cause: None,
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_cause(mut self, cause: ErrorNode) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl ForeignError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }
}

impl ErrorNode {
    pub fn name(&self) -> &str {
        match self {
            ErrorNode::Remote(e) => &e.name,
            ErrorNode::Domain(e) => &e.name,
            ErrorNode::Foreign(e) => &e.name,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ErrorNode::Remote(e) => &e.message,
            ErrorNode::Domain(e) => &e.message,
            ErrorNode::Foreign(e) => &e.message,
        }
    }

    /// Next node in the chain. Foreign nodes never have one.
    pub fn cause(&self) -> Option<&ErrorNode> {
        match self {
            ErrorNode::Remote(e) => e.cause.as_deref(),
            ErrorNode::Domain(e) => e.cause.as_deref(),
            ErrorNode::Foreign(_) => None,
        }
    }

    /// Walk the chain from this node, at most [`MAX_CHAIN_DEPTH`] nodes.
    pub fn iter(&self) -> ChainIter<'_> {
        ChainIter {
            next: Some(self),
            remaining: MAX_CHAIN_DEPTH,
        }
    }

    /// Strip remote-call wrappers and return the first node that is not one.
    ///
    /// A wrapper without a cause is returned as is.
    pub fn innermost(&self) -> &ErrorNode {
        let mut current = self;
        for _ in 0..MAX_CHAIN_DEPTH {
            match current {
                ErrorNode::Remote(RemoteError {
                    cause: Some(cause), ..
                }) => current = cause,
                _ => break,
            }
        }
        current
    }

    pub fn classify_auth(&self) -> AuthFailure {
        match self.innermost() {
            ErrorNode::Domain(e) if e.name == AUTH_MISSING => AuthFailure::Missing,
            ErrorNode::Domain(e) if e.name == AUTH_DENIED => AuthFailure::Denied,
            _ => AuthFailure::Other,
        }
    }

    /// Exit status of the first domain node in the chain.
    pub fn exit_code(&self) -> i32 {
        self.iter()
            .find_map(|node| match node {
                ErrorNode::Domain(e) => Some(e.exit_code),
                _ => None,
            })
            .unwrap_or(UNCLASSIFIED_EXIT_CODE)
    }

    /// Serialize in the agent's wire shape. Foreign errors are down-cast to
    /// `{type, data: {message, stack, cause}}`.
    pub fn to_json(&self) -> Value {
        self.to_json_bounded(MAX_CHAIN_DEPTH)
    }

    fn to_json_bounded(&self, depth: usize) -> Value {
        let cause_json = |cause: &Option<Box<ErrorNode>>| match cause {
            Some(cause) if depth > 1 => cause.to_json_bounded(depth - 1),
            _ => Value::Null,
        };
        match self {
            ErrorNode::Remote(e) => {
                let mut metadata = Map::new();
                metadata.insert("nodeId".to_string(), json!(e.node_id));
                metadata.insert("host".to_string(), json!(e.host));
                metadata.insert("port".to_string(), json!(e.port));
                metadata.insert("command".to_string(), json!(e.command));
                metadata.extend(e.metadata.clone());
                json!({
                    "type": e.name,
                    "description": e.description,
                    "data": {
                        "message": e.message,
                        "timestamp": e.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                        "metadata": metadata,
                        "cause": cause_json(&e.cause),
                    },
                })
            }
            ErrorNode::Domain(e) => json!({
                "type": e.name,
                "description": e.description,
                "data": {
                    "message": e.message,
                    "exitCode": e.exit_code,
                    "data": e.data,
                    "cause": cause_json(&e.cause),
                },
            }),
            ErrorNode::Foreign(e) => json!({
                "type": e.name,
                "data": {
                    "message": e.message,
                    "stack": e.stack,
                    "cause": Value::Null,
                },
            }),
        }
    }

    /// Decode an error in the agent's wire shape.
    ///
    /// Objects with a `description` are domain or remote errors; anything else
    /// with a `type` is foreign. Values that are not error objects at all
    /// become a foreign `Error` carrying their JSON text.
    pub fn from_json(value: &Value) -> ErrorNode {
        Self::from_json_bounded(value, MAX_CHAIN_DEPTH)
    }

    fn from_json_bounded(value: &Value, depth: usize) -> ErrorNode {
        let Some(obj) = value.as_object() else {
            return ErrorNode::Foreign(ForeignError::new("Error", value.to_string()));
        };
        let Some(name) = obj.get("type").and_then(Value::as_str) else {
            return ErrorNode::Foreign(ForeignError::new("Error", value.to_string()));
        };
        let empty = Map::new();
        let data = obj.get("data").and_then(Value::as_object).unwrap_or(&empty);
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let cause = match data.get("cause") {
            Some(Value::Null) | None => None,
            Some(_) if depth <= 1 => None,
            Some(cause) => Some(Box::new(Self::from_json_bounded(cause, depth - 1))),
        };
        let Some(description) = obj.get("description").and_then(Value::as_str) else {
            return ErrorNode::Foreign(ForeignError {
                name: name.to_string(),
                message,
                stack: data.get("stack").and_then(Value::as_str).map(str::to_string),
            });
        };

        if let Some(metadata) = data.get("metadata").and_then(Value::as_object) {
            let field = |key: &str| {
                metadata
                    .get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            let timestamp = data
                .get("timestamp")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(Utc::now);
            return ErrorNode::Remote(RemoteError {
                name: name.to_string(),
                description: description.to_string(),
                message,
                node_id: field("nodeId"),
                host: field("host"),
                port: metadata
                    .get("port")
                    .and_then(Value::as_u64)
                    .and_then(|p| u16::try_from(p).ok())
                    .unwrap_or_default(),
                command: field("command"),
                timestamp,
                metadata: metadata
                    .iter()
                    .filter(|(key, _)| !REMOTE_METADATA_KEYS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
                cause,
            });
        }

        ErrorNode::Domain(DomainError {
            name: name.to_string(),
            description: description.to_string(),
            message,
            exit_code: data
                .get("exitCode")
                .and_then(Value::as_i64)
                .and_then(|c| i32::try_from(c).ok())
                .unwrap_or(UNCLASSIFIED_EXIT_CODE),
            data: data
                .get("data")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            cause,
        })
    }
}

impl fmt::Display for ErrorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorNode::Remote(RemoteError {
                name,
                description,
                message,
                ..
            })
            | ErrorNode::Domain(DomainError {
                name,
                description,
                message,
                ..
            }) => {
                write!(f, "{}", name)?;
                if !description.is_empty() {
                    write!(f, ": {}", description)?;
                }
                if !message.is_empty() {
                    write!(f, " - {}", message)?;
                }
                Ok(())
            }
            ErrorNode::Foreign(e) => write!(f, "{}: {}", e.name, e.message),
        }
    }
}

impl std::error::Error for ErrorNode {}

/// Bounded iterator over a chain, outermost first.
pub struct ChainIter<'a> {
    next: Option<&'a ErrorNode>,
    remaining: usize,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a ErrorNode;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = current.cause();
        Some(current)
    }
}
