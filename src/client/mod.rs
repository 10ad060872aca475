// Node client capability: the seam between polling logic and the pRPC transport

mod prpc;

pub use prpc::PrpcClient;

use async_trait::async_trait;
use std::time::Duration;

use crate::models::{NodeStats, PodsResult};

/// Error from a single call against one node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("RPC response carried no result")]
    EmptyResult,
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout)
    }
}

/// What the monitor needs from a pNode. Every call is independent and fallible.
#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn get_stats(&self, address: &str) -> Result<NodeStats, ClientError>;

    /// Peers with their own stats; not every node build exposes this.
    async fn get_pods_with_stats(&self, address: &str) -> Result<PodsResult, ClientError>;

    async fn get_pods(&self, address: &str) -> Result<PodsResult, ClientError>;
}

/// Outcome of asking a node for its peers.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerListing {
    /// `get-pods-with-stats` answered.
    Rich(PodsResult),
    /// Rich call failed, plain `get-pods` answered.
    Basic(PodsResult),
    /// Both calls failed; carries the error from the plain call.
    Failed(ClientError),
}

impl PeerListing {
    pub fn into_result(self) -> Result<PodsResult, ClientError> {
        match self {
            PeerListing::Rich(p) | PeerListing::Basic(p) => Ok(p),
            PeerListing::Failed(e) => Err(e),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PeerListing::Rich(_) => "rich",
            PeerListing::Basic(_) => "basic",
            PeerListing::Failed(_) => "failed",
        }
    }
}

/// Tries the rich peer call first and falls back to the plain peer list.
///
/// Each call gets its own `timeout`, so a rich call that hangs still leaves
/// room for the fallback.
pub async fn negotiate_peers<C>(client: &C, address: &str, timeout: Duration) -> PeerListing
where
    C: NodeClient + ?Sized,
{
    match bounded(timeout, client.get_pods_with_stats(address)).await {
        Ok(pods) => PeerListing::Rich(pods),
        Err(rich_err) => {
            tracing::debug!(
                address,
                error = %rich_err,
                operation = "get_pods_with_stats",
                "rich peer call failed; falling back to get-pods"
            );
            match bounded(timeout, client.get_pods(address)).await {
                Ok(pods) => PeerListing::Basic(pods),
                Err(e) => PeerListing::Failed(e),
            }
        }
    }
}

/// Runs one client call under `timeout`; elapsing maps to [`ClientError::Timeout`].
pub async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(ClientError::Timeout))
}
