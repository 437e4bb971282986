//! nodectl: client runtime for a password-protected node agent
//!
//! Resolves where the agent listens and which credential to present, retries
//! calls interactively when the agent demands authentication, and renders
//! results and error chains for the terminal or for machines.

pub mod auth;
pub mod auth_retry;
pub mod cli;
pub mod config;
pub mod connection;
pub mod credentials;
pub mod env;
pub mod error;
pub mod error_chain;
pub mod logging;
pub mod render;
pub mod rpc;
pub mod status;
