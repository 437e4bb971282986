//! Credential resolution.
//!
//! Passwords come from exactly one source per call, in precedence order:
//! password file, environment, then a masked prompt. An empty password is a
//! valid password. "No credential" is `Ok(None)`; deciding whether that is an
//! error belongs to the caller.

use crate::auth::AuthMetadata;
use crate::env::{EnvKey, EnvSource};
use crate::error::CliError;
use dialoguer::Password;
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, Once};
use std::thread;
use tracing::{debug, warn};

pub const EXISTING_PASSWORD_PROMPT: &str = "Please enter the password";
pub const NEW_PASSWORD_PROMPT: &str = "Enter new password";
pub const CONFIRM_PASSWORD_PROMPT: &str = "Confirm new password";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match!";

/// Interactive masked input.
pub trait PasswordPrompt {
    /// Read one masked entry. `Ok(None)` when there is no terminal to ask or
    /// the user cancelled.
    fn password(&self, prompt: &str) -> Result<Option<String>, CliError>;

    /// Show a diagnostic to whoever is at the terminal.
    fn notify(&self, message: &str);
}

/// Prompts on the controlling terminal via dialoguer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn password(&self, prompt: &str) -> Result<Option<String>, CliError> {
        if !(std::io::stdin().is_terminal() && std::io::stderr().is_terminal()) {
            debug!("No terminal available, skipping password prompt");
            return Ok(None);
        }
        install_interrupt_handler();
        let prompt = prompt.to_string();
        let answer = wait_for_answer(move || {
            Password::new()
                .with_prompt(prompt)
                .allow_empty_password(true)
                .interact()
        })?;
        if answer.is_none() {
            eprintln!();
        }
        Ok(answer)
    }

    fn notify(&self, message: &str) {
        eprintln!("{}", message);
    }
}

enum PromptEvent {
    Answered(Result<String, dialoguer::Error>),
    Interrupted,
}

/// Sender of the prompt currently waiting for input, if any.
static ACTIVE_PROMPT: Mutex<Option<Sender<PromptEvent>>> = Mutex::new(None);
static INTERRUPT_HANDLER: Once = Once::new();

/// Route SIGINT to the active prompt. Outside a prompt, Ctrl-C still ends the
/// process with the conventional status.
fn install_interrupt_handler() {
    INTERRUPT_HANDLER.call_once(|| {
        let installed = ctrlc::set_handler(|| {
            if !interrupt_prompt() {
                std::process::exit(130);
            }
        });
        if let Err(e) = installed {
            warn!(error = %e, "Failed to install interrupt handler for password prompts");
        }
    });
}

/// Cancel the active prompt. Returns false when no prompt is waiting.
fn interrupt_prompt() -> bool {
    let Ok(active) = ACTIVE_PROMPT.lock() else {
        return false;
    };
    match active.as_ref() {
        Some(sender) => sender.send(PromptEvent::Interrupted).is_ok(),
        None => false,
    }
}

/// Run a blocking terminal read on its own thread so an interrupt can end the
/// wait. An interrupted or abandoned read is `Ok(None)`.
fn wait_for_answer<F>(read: F) -> Result<Option<String>, CliError>
where
    F: FnOnce() -> Result<String, dialoguer::Error> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    if let Ok(mut active) = ACTIVE_PROMPT.lock() {
        *active = Some(sender.clone());
    }
    thread::spawn(move || {
        let _ = sender.send(PromptEvent::Answered(read()));
    });
    let event = receiver.recv();
    if let Ok(mut active) = ACTIVE_PROMPT.lock() {
        *active = None;
    }

    match event {
        Ok(PromptEvent::Answered(Ok(password))) => Ok(Some(password)),
        Ok(PromptEvent::Answered(Err(e))) => Err(CliError::Prompt(e.to_string())),
        Ok(PromptEvent::Interrupted) | Err(_) => {
            debug!("Password prompt cancelled");
            Ok(None)
        }
    }
}

pub struct CredentialResolver<E, P> {
    env: E,
    prompt: P,
}

impl<E: EnvSource, P: PasswordPrompt> CredentialResolver<E, P> {
    pub fn new(env: E, prompt: P) -> Self {
        Self { env, prompt }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// Password for an existing credential: file, `NODECTL_PASSWORD`, prompt.
    pub fn resolve_existing(
        &self,
        password_file: Option<&Path>,
    ) -> Result<Option<String>, CliError> {
        if let Some(path) = password_file {
            debug!(path = %path.display(), "Reading password from file");
            return read_password_file(path).map(Some);
        }
        if let Some(password) = self.env.var(EnvKey::Password) {
            debug!("Using password from {}", EnvKey::Password.as_str());
            return Ok(Some(password));
        }
        self.prompt.password(EXISTING_PASSWORD_PROMPT)
    }

    /// Password for a credential being established.
    ///
    /// With `treat_as_existing`, `NODECTL_PASSWORD` is skipped since it holds
    /// the credential being replaced. The interactive path asks twice and
    /// repeats until both entries match.
    pub fn resolve_new(
        &self,
        password_file: Option<&Path>,
        treat_as_existing: bool,
    ) -> Result<Option<String>, CliError> {
        if let Some(path) = password_file {
            debug!(path = %path.display(), "Reading new password from file");
            return read_password_file(path).map(Some);
        }
        if !treat_as_existing {
            if let Some(password) = self.env.var(EnvKey::Password) {
                debug!("Using new password from {}", EnvKey::Password.as_str());
                return Ok(Some(password));
            }
        }
        if let Some(password) = self.env.var(EnvKey::PasswordNew) {
            debug!("Using new password from {}", EnvKey::PasswordNew.as_str());
            return Ok(Some(password));
        }
        loop {
            let Some(first) = self.prompt.password(NEW_PASSWORD_PROMPT)? else {
                return Ok(None);
            };
            let Some(second) = self.prompt.password(CONFIRM_PASSWORD_PROMPT)? else {
                return Ok(None);
            };
            if first == second {
                return Ok(Some(first));
            }
            self.prompt.notify(PASSWORD_MISMATCH);
        }
    }

    /// Authorization for a call without prompting: password file,
    /// `NODECTL_PASSWORD`, `NODECTL_TOKEN`, else empty metadata.
    pub fn resolve_authorization(
        &self,
        password_file: Option<&Path>,
    ) -> Result<AuthMetadata, CliError> {
        if let Some(path) = password_file {
            return Ok(AuthMetadata::from_password(&read_password_file(path)?));
        }
        if let Some(password) = self.env.var(EnvKey::Password) {
            return Ok(AuthMetadata::from_password(&password));
        }
        if let Some(token) = self.env.var(EnvKey::Token) {
            return Ok(AuthMetadata::from_token(&token));
        }
        debug!("No credential available, calling unauthenticated");
        Ok(AuthMetadata::none())
    }
}

fn read_password_file(path: &Path) -> Result<String, CliError> {
    let mut file = std::fs::File::open(path).map_err(|source| CliError::PasswordFileRead {
        path: path.to_path_buf(),
        syscall: "open",
        source,
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|source| CliError::PasswordFileRead {
            path: path.to_path_buf(),
            syscall: "read",
            source,
        })?;
    Ok(contents.trim().to_string())
}
