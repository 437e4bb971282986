//! Agent status descriptor.
//!
//! The agent keeps `<node_path>/status.json` current through its lifecycle.
//! This side only reads it; anything that cannot be read or parsed is `DEAD`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const STATUS_FILE_NAME: &str = "status.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentStatus {
    Starting,
    Live,
    Stopping,
    Dead,
}

impl AgentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Starting => "STARTING",
            AgentStatus::Live => "LIVE",
            AgentStatus::Stopping => "STOPPING",
            AgentStatus::Dead => "DEAD",
        }
    }
}

/// Connection coordinates published while the agent is `LIVE`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDescriptor {
    pub status: AgentStatus,
    #[serde(default)]
    pub data: StatusData,
}

impl StatusDescriptor {
    pub fn dead() -> Self {
        Self {
            status: AgentStatus::Dead,
            data: StatusData::default(),
        }
    }

    /// `(node_id, host, port)` if the agent is live and published all three.
    pub fn live_coordinates(&self) -> Option<(&str, &str, u16)> {
        if self.status != AgentStatus::Live {
            return None;
        }
        match (&self.data.node_id, &self.data.client_host, self.data.client_port) {
            (Some(node_id), Some(host), Some(port)) => {
                Some((node_id.as_str(), host.as_str(), port))
            }
            _ => None,
        }
    }
}

/// Source of status descriptors. `None` means no readable descriptor.
pub trait StatusReader {
    fn read_status(&self, node_path: &Path) -> Option<StatusDescriptor>;
}

/// Reads `status.json` from the node path.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStatusReader;

impl FileStatusReader {
    pub fn status_path(node_path: &Path) -> PathBuf {
        node_path.join(STATUS_FILE_NAME)
    }
}

impl StatusReader for FileStatusReader {
    fn read_status(&self, node_path: &Path) -> Option<StatusDescriptor> {
        let path = Self::status_path(node_path);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No readable status descriptor");
                return None;
            }
        };
        match serde_json::from_str::<StatusDescriptor>(&contents) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed status descriptor");
                None
            }
        }
    }
}
