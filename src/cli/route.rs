//! CLI route: single route table and run context. Each command resolves its
//! connection, makes its agent calls through the auth retry coordinator and
//! hands back a renderable value.

use crate::auth_retry::AuthRetryCoordinator;
use crate::cli::output::shape_result;
use crate::cli::parse::{AgentCommands, Commands, GlobalArgs, KeysCommands};
use crate::config::NodectlConfig;
use crate::connection::{ConnectionOptions, ConnectionParameters, ConnectionResolver, NodeId};
use crate::credentials::{CredentialResolver, PasswordPrompt, TerminalPrompt};
use crate::env::{EnvSource, ProcessEnv};
use crate::error::CliError;
use crate::render::{OutputFormat, OutputValue};
use crate::rpc::{JsonRpcClient, RemoteCall};
use crate::status::{AgentStatus, FileStatusReader, StatusReader};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::info;

/// Command name for logs (e.g. "agent.status", "call").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Agent {
            command: AgentCommands::Status,
        } => "agent.status",
        Commands::Agent {
            command: AgentCommands::Stop,
        } => "agent.stop",
        Commands::Keys {
            command: KeysCommands::Password { .. },
        } => "keys.password",
        Commands::Call { .. } => "call",
    }
}

/// Connection coordinates from flags and their env fallbacks.
pub fn connection_options(global: &GlobalArgs) -> Result<ConnectionOptions, CliError> {
    let node_id = global
        .node_id
        .as_deref()
        .map(str::parse::<NodeId>)
        .transpose()?;
    Ok(ConnectionOptions {
        node_id,
        host: global.client_host.clone(),
        port: global.client_port,
    })
}

/// Runtime context for CLI execution: configuration, connection options and
/// the resolvers every command goes through.
pub struct RunContext<E = ProcessEnv, P = TerminalPrompt, R = FileStatusReader> {
    config: NodectlConfig,
    connection: ConnectionOptions,
    password_file: Option<PathBuf>,
    credentials: CredentialResolver<E, P>,
    resolver: ConnectionResolver<R>,
}

impl RunContext {
    /// Context reading the real environment and prompting on the terminal.
    pub fn new(config: NodectlConfig, global: &GlobalArgs) -> Result<Self, CliError> {
        Ok(Self::with_parts(
            config,
            connection_options(global)?,
            global.password_file.clone(),
            CredentialResolver::new(ProcessEnv, TerminalPrompt),
            ConnectionResolver::new(),
        ))
    }
}

impl<E: EnvSource, P: PasswordPrompt, R: StatusReader> RunContext<E, P, R> {
    pub fn with_parts(
        config: NodectlConfig,
        connection: ConnectionOptions,
        password_file: Option<PathBuf>,
        credentials: CredentialResolver<E, P>,
        resolver: ConnectionResolver<R>,
    ) -> Self {
        Self {
            config,
            connection,
            password_file,
            credentials,
            resolver,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.config.format
    }

    /// Run one command to completion on a current-thread runtime.
    pub fn execute(&self, command: &Commands) -> Result<OutputValue, CliError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.execute_async(command))
    }

    pub async fn execute_async(&self, command: &Commands) -> Result<OutputValue, CliError> {
        info!(command = command_name(command), "Running command");
        let result = match command {
            Commands::Agent {
                command: AgentCommands::Status,
            } => self.agent_status().await,
            Commands::Agent {
                command: AgentCommands::Stop,
            } => self.agent_stop().await,
            Commands::Keys {
                command: KeysCommands::Password { password_new_file },
            } => self.keys_password(password_new_file.as_deref()).await,
            Commands::Call { method, params } => self.call_method(method, params.as_deref()).await,
        };
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            "Command finished"
        );
        result
    }

    async fn agent_status(&self) -> Result<OutputValue, CliError> {
        let status = self
            .resolver
            .resolve_status(&self.config.node_path, &self.connection)?;
        let mut fields = Map::new();
        let Some(params) = status.connection else {
            fields.insert("status".to_string(), json!(status.status.status.as_str()));
            return Ok(shape_result(Value::Object(fields), self.format()));
        };

        let client = self.dial(params)?;
        let result = self.invoke(&client, "agentStatus", json!({})).await?;
        fields.insert("status".to_string(), json!(AgentStatus::Live.as_str()));
        match result {
            Value::Object(reported) => {
                fields.extend(reported.into_iter().filter(|(key, _)| key != "status"));
            }
            Value::Null => {}
            other => {
                fields.insert("result".to_string(), other);
            }
        }
        Ok(shape_result(Value::Object(fields), self.format()))
    }

    async fn agent_stop(&self) -> Result<OutputValue, CliError> {
        let client = self.dial(self.resolve()?)?;
        let result = self.invoke(&client, "agentStop", json!({})).await?;
        Ok(shape_result(result, self.format()))
    }

    async fn keys_password(&self, password_new_file: Option<&Path>) -> Result<OutputValue, CliError> {
        let client = self.dial(self.resolve()?)?;
        let Some(password) = self.credentials.resolve_new(password_new_file, true)? else {
            return Err(CliError::PasswordMissing);
        };
        let result = self
            .invoke(&client, "keysPasswordChange", json!({ "password": password }))
            .await?;
        Ok(shape_result(result, self.format()))
    }

    async fn call_method(&self, method: &str, params: Option<&str>) -> Result<OutputValue, CliError> {
        let params = match params {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| CliError::InvalidParams(format!("{}: {}", raw, e)))?,
            None => json!({}),
        };
        let client = self.dial(self.resolve()?)?;
        let result = self.invoke(&client, method, params).await?;
        Ok(shape_result(result, self.format()))
    }

    fn resolve(&self) -> Result<ConnectionParameters, CliError> {
        self.resolver.resolve(&self.config.node_path, &self.connection)
    }

    fn dial(&self, params: ConnectionParameters) -> Result<JsonRpcClient, CliError> {
        JsonRpcClient::new(params, &self.config.rpc)
    }

    /// One logical call: starts with whatever credential is available without
    /// prompting and escalates interactively when the agent asks for it.
    pub async fn invoke(
        &self,
        client: &dyn RemoteCall,
        method: &str,
        params: Value,
    ) -> Result<Value, CliError> {
        let initial = self
            .credentials
            .resolve_authorization(self.password_file.as_deref())?;
        AuthRetryCoordinator::new(&self.credentials)
            .call(initial, |metadata| {
                let params = params.clone();
                async move { client.call(method, &metadata, params).await }
            })
            .await
    }
}
