// Domain models: pRPC wire types, per-node results, cluster snapshots

mod node;
mod snapshot;

pub use node::{NodeResult, NodeStats, NodeStatus, PeerInfo, PodsResult};
pub use snapshot::{ClusterAggregates, ClusterSnapshot};
