//! Environment access for credential resolution.
//!
//! Credential lookups go through [`EnvSource`] instead of `std::env` so the
//! precedence chain and unattended-mode detection run against a plain map in
//! tests.

use std::collections::HashMap;

/// Environment variables read by the client runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKey {
    NodePath,
    NodeId,
    ClientHost,
    ClientPort,
    Password,
    PasswordNew,
    Token,
}

impl EnvKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NodePath => "NODECTL_NODE_PATH",
            Self::NodeId => "NODECTL_NODE_ID",
            Self::ClientHost => "NODECTL_CLIENT_HOST",
            Self::ClientPort => "NODECTL_CLIENT_PORT",
            Self::Password => "NODECTL_PASSWORD",
            Self::PasswordNew => "NODECTL_PASSWORD_NEW",
            Self::Token => "NODECTL_TOKEN",
        }
    }
}

/// Read-only view of environment variables.
pub trait EnvSource {
    fn var(&self, key: EnvKey) -> Option<String>;

    /// A pre-supplied credential means nobody is at the terminal.
    fn is_unattended(&self) -> bool {
        self.var(EnvKey::Password).is_some() || self.var(EnvKey::Token).is_some()
    }
}

/// The real process environment. Non-UTF-8 values read as absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: EnvKey) -> Option<String> {
        std::env::var(key.as_str()).ok()
    }
}

/// Fixed set of variables.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<&'static str, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: EnvKey, value: impl Into<String>) -> Self {
        self.vars.insert(key.as_str(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: EnvKey) -> Option<String> {
        self.vars.get(key.as_str()).cloned()
    }
}
