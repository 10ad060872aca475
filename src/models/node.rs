// Per-node wire models (pRPC get-stats / get-pods) and per-round node results

use serde::{Deserialize, Serialize};

/// Point-in-time telemetry reported by a pNode's `get-stats` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    pub active_streams: u64,
    pub cpu_percent: f64,
    pub current_index: u64,
    /// Stored data in bytes.
    pub file_size: u64,
    /// Unix timestamp (seconds).
    pub last_updated: i64,
    pub packets_received: u64,
    pub packets_sent: u64,
    pub ram_total: u64,
    pub ram_used: u64,
    pub total_bytes: u64,
    pub total_pages: u64,
    /// Seconds since the node process started.
    pub uptime: u64,
}

/// One peer entry from a seed's `get-pods` / `get-pods-with-stats` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerInfo {
    /// Gossip address, e.g. "147.93.179.46:9001".
    pub address: String,
    pub last_seen_timestamp: i64,
    pub pubkey: String,
    pub version: String,
}

/// Peer list as reported by one node; `total_count` is the node's network-wide figure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodsResult {
    #[serde(default)]
    pub pods: Vec<PeerInfo>,
    #[serde(default)]
    pub total_count: u64,
}

/// Node state for the most recent round. `Pending` means not yet queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
    Pending,
}

impl NodeStatus {
    pub fn is_online(self) -> bool {
        matches!(self, NodeStatus::Online)
    }
}

/// Outcome of querying one node in one round.
///
/// Fields are private so that `stats.is_some() == status.is_online()` always holds;
/// build values through [`NodeResult::online`], [`NodeResult::offline`] or
/// [`NodeResult::pending`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeResultRepr")]
pub struct NodeResult {
    address: String,
    status: NodeStatus,
    stats: Option<NodeStats>,
    pods: Option<PodsResult>,
    latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Wire shape of [`NodeResult`]; checked on the way in.
#[derive(Deserialize)]
struct NodeResultRepr {
    address: String,
    status: NodeStatus,
    stats: Option<NodeStats>,
    pods: Option<PodsResult>,
    latency_ms: u64,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<NodeResultRepr> for NodeResult {
    type Error = String;

    fn try_from(r: NodeResultRepr) -> Result<Self, Self::Error> {
        if r.stats.is_some() != r.status.is_online() {
            return Err(format!(
                "node {}: stats must be present exactly when status is online",
                r.address
            ));
        }
        Ok(Self {
            address: r.address,
            status: r.status,
            stats: r.stats,
            pods: r.pods,
            latency_ms: r.latency_ms,
            error: r.error,
        })
    }
}

impl NodeResult {
    pub fn online(
        address: impl Into<String>,
        stats: NodeStats,
        pods: Option<PodsResult>,
        latency_ms: u64,
    ) -> Self {
        Self {
            address: address.into(),
            status: NodeStatus::Online,
            stats: Some(stats),
            pods,
            latency_ms,
            error: None,
        }
    }

    /// Offline results carry no latency: nothing completed to measure.
    pub fn offline(address: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            status: NodeStatus::Offline,
            stats: None,
            pods: None,
            latency_ms: 0,
            error: Some(error.into()),
        }
    }

    pub fn pending(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            status: NodeStatus::Pending,
            stats: None,
            pods: None,
            latency_ms: 0,
            error: None,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn is_online(&self) -> bool {
        self.status.is_online()
    }

    pub fn stats(&self) -> Option<&NodeStats> {
        self.stats.as_ref()
    }

    pub fn pods(&self) -> Option<&PodsResult> {
        self.pods.as_ref()
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency_ms
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
