//! Merge rules: built-in defaults under every other source.

use crate::config::default_node_path;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("node_path", default_node_path().to_string_lossy().to_string())?
        .set_default("format", "human")?
        .set_default("rpc.connect_timeout_ms", 10_000_i64)?
        .set_default("rpc.request_timeout_ms", 60_000_i64)?
        .set_default("logging.level", "off")
}
