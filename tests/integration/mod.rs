//! Integration tests for the nodectl client runtime

mod cli_commands;
mod config_files;
mod rpc_client;
