//! CLI domain: parse, route and output only.
//! Single route table dispatches to the resolvers and the auth retry coordinator.

mod output;
mod parse;
mod route;

pub use output::{report_error, shape_error, shape_result, write_output, TABLE_BATCH_ROWS};
pub use parse::{AgentCommands, Cli, Commands, GlobalArgs, KeysCommands};
pub use route::{command_name, connection_options, RunContext};
