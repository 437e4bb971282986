//! Authorization metadata attached to remote calls.

use base64::engine::general_purpose::STANDARD as Base64;
use base64::Engine;
use std::fmt;

/// How a credential is presented to the agent.
#[derive(Clone, PartialEq, Eq)]
pub enum Authorization {
    /// Password, enveloped as HTTP basic credentials with an empty user.
    Basic(String),
    /// Session token, passed through.
    Bearer(String),
}

impl Authorization {
    pub fn from_password(password: &str) -> Self {
        Authorization::Basic(Base64.encode(format!(":{}", password)))
    }

    pub fn from_token(token: &str) -> Self {
        Authorization::Bearer(token.to_string())
    }

    pub fn header_value(&self) -> String {
        match self {
            Authorization::Basic(encoded) => format!("Basic {}", encoded),
            Authorization::Bearer(token) => format!("Bearer {}", token),
        }
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authorization::Basic(_) => f.write_str("Basic(<redacted>)"),
            Authorization::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// Metadata sent with one call. Empty metadata makes an unauthenticated call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthMetadata {
    pub authorization: Option<Authorization>,
}

impl AuthMetadata {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_password(password: &str) -> Self {
        Self {
            authorization: Some(Authorization::from_password(password)),
        }
    }

    pub fn from_token(token: &str) -> Self {
        Self {
            authorization: Some(Authorization::from_token(token)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.authorization.is_none()
    }
}
