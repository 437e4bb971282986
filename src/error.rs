//! Error types for the nodectl client runtime.

use crate::error_chain::{DomainError, ErrorNode};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use thiserror::Error;

/// Process exit statuses the client produces locally (BSD sysexits plus unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok,
    Usage,
    NoInput,
    Software,
    OsErr,
    TempFail,
    Config,
    Unknown,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Ok => 0,
            ExitCode::Usage => 64,
            ExitCode::NoInput => 66,
            ExitCode::Software => 70,
            ExitCode::OsErr => 71,
            ExitCode::TempFail => 75,
            ExitCode::Config => 78,
            ExitCode::Unknown => 255,
        }
    }
}

/// Errors raised by the client runtime itself, plus remote failures.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    ClientOptions(String),

    #[error("Invalid node ID: {0}")]
    InvalidNodeId(String),

    #[error("Agent at {} is not live", node_path.display())]
    AgentNotLive { node_path: PathBuf },

    #[error("Failed to read password file {}: {source}", path.display())]
    PasswordFileRead {
        path: PathBuf,
        syscall: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Password is required")]
    PasswordMissing,

    #[error("Failed to read from terminal: {0}")]
    Prompt(String),

    #[error("Failed to reach agent: {0}")]
    Transport(String),

    #[error("Invalid response from agent: {0}")]
    InvalidResponse(String),

    #[error("Invalid call parameters: {0}")]
    InvalidParams(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Remote(ErrorNode),
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl CliError {
    /// Stable error name shown on stderr and in JSON output.
    pub fn name(&self) -> &str {
        match self {
            CliError::ClientOptions(_) => "ErrorCLIClientOptions",
            CliError::InvalidNodeId(_) => "ErrorCLINodeId",
            CliError::AgentNotLive { .. } => "ErrorCLIAgentStatus",
            CliError::PasswordFileRead { .. } => "ErrorCLIPasswordFileRead",
            CliError::PasswordMissing => "ErrorCLIPasswordMissing",
            CliError::Prompt(_) => "ErrorCLIPrompt",
            CliError::Transport(_) => "ErrorCLITransport",
            CliError::InvalidResponse(_) => "ErrorCLIResponse",
            CliError::InvalidParams(_) => "ErrorCLIInvalidParams",
            CliError::Config(_) => "ErrorCLIConfig",
            CliError::Io(_) => "ErrorCLIIO",
            CliError::Remote(node) => node.name(),
        }
    }

    fn description(&self) -> &'static str {
        match self {
            CliError::ClientOptions(_) => "Missing client options",
            CliError::InvalidNodeId(_) => "Invalid node ID",
            CliError::AgentNotLive { .. } => "Agent is not live",
            CliError::PasswordFileRead { .. } => "Failed to read password file",
            CliError::PasswordMissing => "Password is necessary",
            CliError::Prompt(_) => "Failed to read from terminal",
            CliError::Transport(_) => "Failed to reach the agent",
            CliError::InvalidResponse(_) => "Agent sent an invalid response",
            CliError::InvalidParams(_) => "Invalid call parameters",
            CliError::Config(_) => "Invalid configuration",
            CliError::Io(_) => "I/O failure",
            CliError::Remote(_) => "",
        }
    }

    fn message(&self) -> String {
        match self {
            CliError::ClientOptions(msg)
            | CliError::InvalidNodeId(msg)
            | CliError::Prompt(msg)
            | CliError::Transport(msg)
            | CliError::InvalidResponse(msg)
            | CliError::InvalidParams(msg)
            | CliError::Config(msg) => msg.clone(),
            CliError::AgentNotLive { node_path } => node_path.display().to_string(),
            CliError::PasswordFileRead { source, .. } => source.to_string(),
            CliError::PasswordMissing => String::new(),
            CliError::Io(e) => e.to_string(),
            CliError::Remote(node) => node.message().to_string(),
        }
    }

    fn local_exit_code(&self) -> ExitCode {
        match self {
            CliError::ClientOptions(_)
            | CliError::InvalidNodeId(_)
            | CliError::PasswordMissing
            | CliError::InvalidParams(_) => ExitCode::Usage,
            CliError::AgentNotLive { .. } | CliError::Transport(_) => ExitCode::TempFail,
            CliError::PasswordFileRead { .. } => ExitCode::NoInput,
            CliError::Prompt(_) | CliError::Io(_) => ExitCode::OsErr,
            CliError::InvalidResponse(_) => ExitCode::Software,
            CliError::Config(_) => ExitCode::Config,
            CliError::Remote(_) => ExitCode::Unknown,
        }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Remote(node) => node.exit_code(),
            other => other.local_exit_code().code(),
        }
    }

    fn data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        if let CliError::PasswordFileRead {
            path,
            syscall,
            source,
        } = self
        {
            if let Some(errno) = source.raw_os_error() {
                data.insert("errno".to_string(), json!(errno));
            }
            data.insert("code".to_string(), json!(format!("{:?}", source.kind())));
            data.insert("syscall".to_string(), json!(syscall));
            data.insert("path".to_string(), json!(path.display().to_string()));
        }
        data
    }

    /// View this error as a chain for rendering.
    pub fn to_error_node(&self) -> ErrorNode {
        match self {
            CliError::Remote(node) => node.clone(),
            other => ErrorNode::Domain(
                DomainError::new(
                    other.name(),
                    other.description(),
                    other.message(),
                    other.local_exit_code().code(),
                )
                .with_data(other.data()),
            ),
        }
    }
}
