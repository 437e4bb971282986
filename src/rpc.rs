//! Remote calls to the agent.
//!
//! The agent's client service speaks JSON-RPC 2.0 over HTTP. Errors it
//! returns carry the serialized error chain in `error.data`; they come back
//! as [`CliError::Remote`] wrapped in a node recording this hop.

use crate::auth::AuthMetadata;
use crate::connection::ConnectionParameters;
use crate::error::CliError;
use crate::error_chain::{ErrorNode, ForeignError, RemoteError};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

pub const RPC_PATH: &str = "/rpc";

/// Transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// A single named call against the agent.
#[async_trait]
pub trait RemoteCall: Send + Sync {
    async fn call(
        &self,
        method: &str,
        metadata: &AuthMetadata,
        params: Value,
    ) -> Result<Value, CliError>;
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

fn map_http_error(error: reqwest::Error) -> CliError {
    if error.is_timeout() {
        CliError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        CliError::Transport(format!("Connection error: {}", error))
    } else if error.is_decode() {
        CliError::InvalidResponse(error.to_string())
    } else {
        CliError::Transport(error.to_string())
    }
}

pub struct JsonRpcClient {
    client: Client,
    url: String,
    connection: ConnectionParameters,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(connection: ConnectionParameters, config: &RpcConfig) -> Result<Self, CliError> {
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| CliError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        let url = format!("http://{}{}", authority(&connection.host, connection.port), RPC_PATH);
        Ok(Self {
            client,
            url,
            connection,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn remote_error(&self, method: &str, error: JsonRpcError) -> CliError {
        let cause = match error.data {
            Some(data) if data.get("type").is_some() => ErrorNode::from_json(&data),
            _ => ErrorNode::Foreign(ForeignError::new(
                "JsonRpcError",
                format!("{} (code {})", error.message, error.code),
            )),
        };
        CliError::Remote(ErrorNode::Remote(RemoteError::wrap(
            cause,
            self.connection.node_id.as_str(),
            self.connection.host.as_str(),
            self.connection.port,
            method,
        )))
    }
}

fn authority(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

#[async_trait]
impl RemoteCall for JsonRpcClient {
    async fn call(
        &self,
        method: &str,
        metadata: &AuthMetadata,
        params: Value,
    ) -> Result<Value, CliError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!(method, id, authenticated = !metadata.is_empty(), url = %self.url, "Sending RPC request");

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(authorization) = &metadata.authorization {
            builder = builder.header(AUTHORIZATION, authorization.header_value());
        }
        let response = builder.send().await.map_err(map_http_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_http_error)?;
        let parsed: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
            CliError::InvalidResponse(format!("HTTP {} with undecodable body: {}", status, e))
        })?;

        match (parsed.error, parsed.result) {
            (Some(error), _) => {
                debug!(method, code = error.code, "RPC returned an error");
                Err(self.remote_error(method, error))
            }
            (None, Some(result)) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}
