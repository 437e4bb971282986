//! Configuration System
//!
//! Layered configuration: built-in defaults, the global config file, a file
//! named with `--config`, then command-line flags.

use crate::error::CliError;
use crate::logging::LoggingConfig;
use crate::render::OutputFormat;
use crate::rpc::RpcConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

mod merge {
    pub mod merge_policy;
}
mod sources {
    pub mod explicit_file;
    pub mod global_file;
}

pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodectlConfig {
    /// Node state directory holding the agent's status file
    #[serde(default = "default_node_path")]
    pub node_path: PathBuf,

    /// Output format for results and errors
    #[serde(default)]
    pub format: OutputFormat,

    /// Agent transport settings
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Platform data directory for nodectl, or `./.nodectl` when there is no home.
pub fn default_node_path() -> PathBuf {
    ProjectDirs::from("", "", "nodectl")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".nodectl"))
}

impl Default for NodectlConfig {
    fn default() -> Self {
        Self {
            node_path: default_node_path(),
            format: OutputFormat::default(),
            rpc: RpcConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub node_path: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub verbose: bool,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_output: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl ConfigOverrides {
    fn effective_log_level(&self) -> Option<String> {
        match (&self.log_level, self.verbose) {
            (Some(level), _) => Some(level.clone()),
            (None, true) => Some("debug".to_string()),
            (None, false) => None,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the global config file at its default location.
    pub fn load(
        explicit: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<NodectlConfig, CliError> {
        Self::load_layers(global_config_path().as_deref(), explicit, overrides)
    }

    /// Load a single file over the defaults.
    pub fn load_from_file(path: &Path) -> Result<NodectlConfig, CliError> {
        Self::load_layers(None, Some(path), &ConfigOverrides::default())
    }

    pub fn load_layers(
        global: Option<&Path>,
        explicit: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<NodectlConfig, CliError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder, global)?;
        if let Some(path) = explicit {
            debug!(config_path = %path.display(), "Loading configuration file");
            builder = sources::explicit_file::add_to_builder(builder, path)?;
        }

        let format = overrides.format.map(|format| match format {
            OutputFormat::Human => "human",
            OutputFormat::Json => "json",
        });
        builder = builder
            .set_override_option(
                "node_path",
                overrides
                    .node_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string()),
            )?
            .set_override_option("format", format)?
            .set_override_option("logging.level", overrides.effective_log_level())?
            .set_override_option("logging.format", overrides.log_format.clone())?
            .set_override_option("logging.output", overrides.log_output.clone())?
            .set_override_option(
                "logging.file",
                overrides
                    .log_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string()),
            )?;

        let config: NodectlConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

impl NodectlConfig {
    /// Validate values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.node_path.as_os_str().is_empty() {
            return Err(CliError::Config("node_path must not be empty".to_string()));
        }
        if self.rpc.connect_timeout_ms == 0 || self.rpc.request_timeout_ms == 0 {
            return Err(CliError::Config(
                "rpc timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
