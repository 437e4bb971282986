//! Retry-on-auth-failure for remote calls.
//!
//! A call is first made with whatever metadata the caller resolved (possibly
//! none). If the agent answers that authorization is missing or denied, the
//! user is asked for a password and the call is repeated, for as long as the
//! agent keeps denying the entered password:
//!
//! ```text
//! Initial --ok--> Done
//! Initial --missing|denied (attended)--> Retry
//! Retry   --ok--> Done
//! Retry   --denied--> Retry
//! *       --anything else--> Failed
//! ```
//!
//! When a credential was pre-supplied through the environment nobody is at
//! the terminal, so the first failure is final. The wrapped call may run
//! several times; it must tolerate that.

use crate::auth::AuthMetadata;
use crate::credentials::{CredentialResolver, PasswordPrompt, EXISTING_PASSWORD_PROMPT};
use crate::env::EnvSource;
use crate::error::CliError;
use crate::error_chain::AuthFailure;
use std::future::Future;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Initial,
    Retry,
}

/// Where a failed attempt leads. `None` is the terminal failed state.
pub fn next_state(state: RetryState, failure: AuthFailure, unattended: bool) -> Option<RetryState> {
    match (state, failure) {
        (RetryState::Initial, _) if unattended => None,
        (RetryState::Initial, AuthFailure::Missing | AuthFailure::Denied) => Some(RetryState::Retry),
        (RetryState::Retry, AuthFailure::Denied) => Some(RetryState::Retry),
        _ => None,
    }
}

/// Auth classification of a call failure. Only agent errors can be auth errors.
pub fn classify(err: &CliError) -> AuthFailure {
    match err {
        CliError::Remote(node) => node.classify_auth(),
        _ => AuthFailure::Other,
    }
}

pub struct AuthRetryCoordinator<'a, E, P> {
    credentials: &'a CredentialResolver<E, P>,
}

impl<'a, E: EnvSource, P: PasswordPrompt> AuthRetryCoordinator<'a, E, P> {
    pub fn new(credentials: &'a CredentialResolver<E, P>) -> Self {
        Self { credentials }
    }

    /// Run `call`, re-authenticating interactively when the agent asks for it.
    pub async fn call<T, F, Fut>(&self, initial: AuthMetadata, mut call: F) -> Result<T, CliError>
    where
        F: FnMut(AuthMetadata) -> Fut,
        Fut: Future<Output = Result<T, CliError>>,
    {
        let unattended = self.credentials.env().is_unattended();
        let mut state = RetryState::Initial;
        let mut metadata = initial;
        loop {
            let err = match call(metadata).await {
                Ok(result) => {
                    debug!(?state, "Call succeeded");
                    return Ok(result);
                }
                Err(err) => err,
            };
            let failure = classify(&err);
            let Some(next) = next_state(state, failure, unattended) else {
                debug!(?state, ?failure, unattended, "Call failed, not retrying");
                return Err(err);
            };
            info!(?failure, "Agent requires authentication, prompting for password");
            state = next;

            let Some(password) = self.credentials.prompt().password(EXISTING_PASSWORD_PROMPT)? else {
                return Err(CliError::PasswordMissing);
            };
            metadata = AuthMetadata::from_password(&password);
        }
    }
}
