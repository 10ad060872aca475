// Cluster aggregates and chart series derived from one round's results

use serde::Serialize;

use crate::models::{ClusterAggregates, NodeResult, NodeStats};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn online_stats(results: &[NodeResult]) -> impl Iterator<Item = (&NodeResult, &NodeStats)> {
    results
        .iter()
        .filter(|r| r.is_online())
        .filter_map(|r| r.stats().map(|s| (r, s)))
}

/// Totals over online nodes. `avg_cpu` is 0 when nothing is online.
pub fn aggregate(results: &[NodeResult]) -> ClusterAggregates {
    let mut online = 0usize;
    let mut total_storage = 0u64;
    let mut cpu_sum = 0.0f64;
    let mut total_streams = 0u64;

    for (_, stats) in online_stats(results) {
        online += 1;
        total_storage = total_storage.saturating_add(stats.file_size);
        cpu_sum += stats.cpu_percent;
        total_streams = total_streams.saturating_add(stats.active_streams);
    }

    let avg_cpu = if online > 0 {
        cpu_sum / online as f64
    } else {
        0.0
    };

    ClusterAggregates {
        online,
        total: results.len(),
        total_storage,
        avg_cpu,
        total_streams,
    }
}

/// One bar of the per-node CPU chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuLoadPoint {
    /// Short label: last dotted segment of the address.
    pub label: String,
    pub address: String,
    pub load: f64,
}

/// One slice of the storage-share chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageShare {
    pub address: String,
    pub gigabytes: f64,
}

/// Online nodes' CPU load, highest first. Ties keep fetch order.
pub fn cpu_distribution(results: &[NodeResult]) -> Vec<CpuLoadPoint> {
    let mut points: Vec<CpuLoadPoint> = online_stats(results)
        .map(|(r, s)| CpuLoadPoint {
            label: r.address().rsplit('.').next().unwrap_or(r.address()).to_string(),
            address: r.address().to_string(),
            load: s.cpu_percent,
        })
        .collect();
    points.sort_by(|a, b| b.load.total_cmp(&a.load));
    points
}

pub fn storage_share(results: &[NodeResult]) -> Vec<StorageShare> {
    online_stats(results)
        .map(|(r, s)| StorageShare {
            address: r.address().to_string(),
            gigabytes: s.file_size as f64 / BYTES_PER_GIB,
        })
        .collect()
}
