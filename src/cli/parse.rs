//! CLI parse: clap types for nodectl. No behavior; definitions only.

use crate::render::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// nodectl - command-line client for the node agent
#[derive(Parser, Debug)]
#[command(name = "nodectl", version)]
#[command(about = "Talk to a running node agent over its authenticated client service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Node state directory
    #[arg(long, global = true, env = "NODECTL_NODE_PATH")]
    pub node_path: Option<PathBuf>,

    /// Node ID of the agent to dial
    #[arg(long, global = true, env = "NODECTL_NODE_ID")]
    pub node_id: Option<String>,

    /// Client service host of the agent
    #[arg(long, global = true, env = "NODECTL_CLIENT_HOST")]
    pub client_host: Option<String>,

    /// Client service port of the agent
    #[arg(long, global = true, env = "NODECTL_CLIENT_PORT")]
    pub client_port: Option<u16>,

    /// File holding the password
    #[arg(long, global = true)]
    pub password_file: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Configuration file path (layered over the global config file)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Agent lifecycle
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// Key management
    Keys {
        #[command(subcommand)]
        command: KeysCommands,
    },
    /// Call an agent method directly
    Call {
        /// Method name
        method: String,
        /// Parameters as a JSON value
        #[arg(long)]
        params: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AgentCommands {
    /// Show the agent's lifecycle status
    Status,
    /// Ask the agent to stop
    Stop,
}

#[derive(Subcommand, Debug, Clone)]
pub enum KeysCommands {
    /// Change the password protecting the node's keys
    Password {
        /// File holding the new password
        #[arg(long)]
        password_new_file: Option<PathBuf>,
    },
}
