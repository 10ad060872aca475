// Cluster-wide models: aggregates and the per-round snapshot

use serde::{Deserialize, Serialize};

use super::NodeResult;
use crate::aggregate::aggregate;

/// Totals and averages over the online nodes of one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterAggregates {
    pub online: usize,
    pub total: usize,
    /// Sum of `file_size` over online nodes (bytes).
    pub total_storage: u64,
    pub avg_cpu: f64,
    pub total_streams: u64,
}

/// Result of one complete discovery -> poll -> aggregate round.
///
/// Never mutated after construction; the scheduler publishes a fresh one per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub nodes: Vec<NodeResult>,
    /// Seed's self-declared network size; `None` when discovery failed.
    pub total_reported: Option<u64>,
    /// Unix ms when the round settled; `None` for the pre-first-round placeholder.
    pub completed_at: Option<u64>,
    pub aggregates: ClusterAggregates,
}

impl ClusterSnapshot {
    pub fn new(nodes: Vec<NodeResult>, total_reported: Option<u64>, completed_at: u64) -> Self {
        let aggregates = aggregate(&nodes);
        Self {
            nodes,
            total_reported,
            completed_at: Some(completed_at),
            aggregates,
        }
    }

    /// Placeholder published before the first round completes: every address pending.
    pub fn pending<S: AsRef<str>>(addresses: &[S]) -> Self {
        let nodes: Vec<NodeResult> = addresses
            .iter()
            .map(|a| NodeResult::pending(a.as_ref()))
            .collect();
        let aggregates = aggregate(&nodes);
        Self {
            nodes,
            total_reported: None,
            completed_at: None,
            aggregates,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}
