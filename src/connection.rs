//! Connection parameter resolution.
//!
//! The agent is dialed either at coordinates given entirely on the command
//! line (or their env fallbacks), or at the coordinates the running agent
//! published in its status descriptor. Mixing the two is a usage error.

use crate::env::EnvKey;
use crate::error::CliError;
use crate::status::{AgentStatus, FileStatusReader, StatusDescriptor, StatusReader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

const NODE_ID_ENCODED_LEN: usize = 52;

/// Remote node identity: multibase base32hex (`v` prefix) of a 256-bit key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for NodeId {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(encoded) = s.strip_prefix('v') else {
            return Err(CliError::InvalidNodeId(format!(
                "'{}' is not base32hex multibase encoded",
                s
            )));
        };
        if encoded.len() != NODE_ID_ENCODED_LEN {
            return Err(CliError::InvalidNodeId(format!(
                "'{}' has {} encoded characters, expected {}",
                s,
                encoded.len(),
                NODE_ID_ENCODED_LEN
            )));
        }
        if !encoded
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'v').contains(&b))
        {
            return Err(CliError::InvalidNodeId(format!(
                "'{}' contains characters outside base32hex",
                s
            )));
        }
        Ok(NodeId(s.to_string()))
    }
}

impl TryFrom<String> for NodeId {
    type Error = CliError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coordinates as supplied by flags or environment; any may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub node_id: Option<NodeId>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved coordinates of the agent's client service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub node_id: NodeId,
    pub host: String,
    pub port: u16,
}

/// Status descriptor plus coordinates, when there are any to dial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStatus {
    pub status: StatusDescriptor,
    pub connection: Option<ConnectionParameters>,
}

enum Mode {
    Explicit(ConnectionParameters),
    FromStatus,
}

pub struct ConnectionResolver<R = FileStatusReader> {
    reader: R,
}

impl ConnectionResolver<FileStatusReader> {
    pub fn new() -> Self {
        Self {
            reader: FileStatusReader,
        }
    }
}

impl Default for ConnectionResolver<FileStatusReader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: StatusReader> ConnectionResolver<R> {
    pub fn with_reader(reader: R) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Resolve coordinates, failing unless they are explicit or the agent is live.
    pub fn resolve(
        &self,
        node_path: &Path,
        options: &ConnectionOptions,
    ) -> Result<ConnectionParameters, CliError> {
        match classify(options)? {
            Mode::Explicit(params) => {
                debug!(node_id = %params.node_id, host = %params.host, port = params.port, "Using explicit connection parameters");
                Ok(params)
            }
            Mode::FromStatus => {
                self.read_descriptor(node_path)
                    .as_ref()
                    .and_then(coordinates_from_status)
                    .ok_or_else(|| CliError::AgentNotLive {
                        node_path: node_path.to_path_buf(),
                    })
            }
        }
    }

    /// Like [`resolve`](Self::resolve), but a non-live agent is reported
    /// through the returned status instead of failing.
    pub fn resolve_status(
        &self,
        node_path: &Path,
        options: &ConnectionOptions,
    ) -> Result<ClientStatus, CliError> {
        let mode = classify(options)?;
        let status = self
            .read_descriptor(node_path)
            .unwrap_or_else(StatusDescriptor::dead);
        let connection = match mode {
            Mode::Explicit(params) => Some(params),
            Mode::FromStatus => coordinates_from_status(&status),
        };
        debug!(status = status.status.as_str(), dialable = connection.is_some(), "Resolved agent status");
        Ok(ClientStatus { status, connection })
    }

    /// A LIVE descriptor missing any coordinate, or carrying a malformed node
    /// ID, reads as no descriptor.
    fn read_descriptor(&self, node_path: &Path) -> Option<StatusDescriptor> {
        let status = self.reader.read_status(node_path)?;
        if status.status != AgentStatus::Live {
            return Some(status);
        }
        match status.live_coordinates() {
            None => {
                warn!(node_path = %node_path.display(), "LIVE status descriptor is missing connection coordinates");
                None
            }
            Some((node_id, ..)) if node_id.parse::<NodeId>().is_err() => {
                warn!(node_path = %node_path.display(), node_id, "LIVE status descriptor has a malformed node ID");
                None
            }
            Some(_) => Some(status),
        }
    }
}

fn classify(options: &ConnectionOptions) -> Result<Mode, CliError> {
    match (&options.node_id, &options.host, options.port) {
        (Some(node_id), Some(host), Some(port)) => Ok(Mode::Explicit(ConnectionParameters {
            node_id: node_id.clone(),
            host: host.clone(),
            port,
        })),
        (None, None, None) => Ok(Mode::FromStatus),
        _ => Err(CliError::ClientOptions(missing_options_message(options))),
    }
}

fn missing_options_message(options: &ConnectionOptions) -> String {
    let fields = [
        (options.node_id.is_none(), "node ID", "--node-id", EnvKey::NodeId),
        (options.host.is_none(), "client host", "--client-host", EnvKey::ClientHost),
        (options.port.is_none(), "client port", "--client-port", EnvKey::ClientPort),
    ];
    fields
        .iter()
        .filter(|(missing, ..)| *missing)
        .map(|(_, what, flag, env)| {
            format!("missing {}, provide it with {} or {}", what, flag, env.as_str())
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn coordinates_from_status(status: &StatusDescriptor) -> Option<ConnectionParameters> {
    let (node_id, host, port) = status.live_coordinates()?;
    Some(ConnectionParameters {
        node_id: node_id.parse().ok()?,
        host: host.to_string(),
        port,
    })
}
