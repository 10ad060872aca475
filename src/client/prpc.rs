// pRPC client: JSON-RPC 2.0 over HTTP POST via reqwest

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::instrument;

use super::{ClientError, NodeClient};
use crate::config::PollingConfig;
use crate::models::{NodeStats, PodsResult};
use crate::version::USER_AGENT;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

pub struct PrpcClient {
    http: reqwest::Client,
    rpc_port: u16,
    rpc_path: String,
    request_id: AtomicU64,
}

impl PrpcClient {
    pub fn new(config: &PollingConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.node_timeout_ms))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            rpc_port: config.rpc_port,
            rpc_path: config.rpc_path.clone(),
            request_id: AtomicU64::new(1),
        })
    }

    /// RPC URL for `address`. An address that already names a port is used as-is.
    pub fn endpoint(&self, address: &str) -> String {
        let authority = if address.parse::<SocketAddr>().is_ok() {
            address.to_string()
        } else if let Ok(IpAddr::V6(ip)) = address.parse::<IpAddr>() {
            format!("[{}]:{}", ip, self.rpc_port)
        } else if has_port(address) {
            address.to_string()
        } else {
            format!("{}:{}", address, self.rpc_port)
        };
        format!("http://{}{}", authority, self.rpc_path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        address: &str,
        method: &str,
    ) -> Result<T, ClientError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
        };

        let response = self
            .http
            .post(self.endpoint(address))
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }

        let body: JsonRpcResponse<T> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout
            } else {
                ClientError::Decode(e.to_string())
            }
        })?;

        if let Some(err) = body.error {
            return Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        body.result.ok_or(ClientError::EmptyResult)
    }
}

fn has_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && !host.contains(':') && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Transport(e.to_string())
    }
}

#[async_trait]
impl NodeClient for PrpcClient {
    #[instrument(skip(self), fields(client = "prpc", operation = "get_stats"))]
    async fn get_stats(&self, address: &str) -> Result<NodeStats, ClientError> {
        self.call(address, "get-stats").await
    }

    #[instrument(skip(self), fields(client = "prpc", operation = "get_pods_with_stats"))]
    async fn get_pods_with_stats(&self, address: &str) -> Result<PodsResult, ClientError> {
        self.call(address, "get-pods-with-stats").await
    }

    #[instrument(skip(self), fields(client = "prpc", operation = "get_pods"))]
    async fn get_pods(&self, address: &str) -> Result<PodsResult, ClientError> {
        self.call(address, "get-pods").await
    }
}
