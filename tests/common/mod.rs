// Shared test helpers: a scripted in-memory NodeClient and model builders

#![allow(dead_code)]

use async_trait::async_trait;
use pnode_monitor::client::{ClientError, NodeClient};
use pnode_monitor::models::*;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Duration;

pub fn stats(cpu_percent: f64, uptime: u64, ram_used: u64, file_size: u64) -> NodeStats {
    NodeStats {
        active_streams: 2,
        cpu_percent,
        current_index: 1000,
        file_size,
        last_updated: 1_700_000_000,
        packets_received: 10,
        packets_sent: 20,
        ram_total: 16 * 1024 * 1024 * 1024,
        ram_used,
        total_bytes: 0,
        total_pages: 0,
        uptime,
    }
}

pub fn pods(addresses: &[&str], total_count: u64) -> PodsResult {
    PodsResult {
        pods: addresses
            .iter()
            .map(|a| PeerInfo {
                address: a.to_string(),
                last_seen_timestamp: 1_700_000_000,
                pubkey: format!("pk-{}", a),
                version: "0.7.0".into(),
            })
            .collect(),
        total_count,
    }
}

pub fn online(address: &str, cpu: f64, uptime: u64) -> NodeResult {
    NodeResult::online(address, stats(cpu, uptime, 0, 0), None, 50)
}

pub fn offline(address: &str, error: &str) -> NodeResult {
    NodeResult::offline(address, error)
}

/// How one scripted node answers.
#[derive(Clone)]
pub struct NodeScript {
    pub stats: Result<NodeStats, ClientError>,
    pub rich_pods: Result<PodsResult, ClientError>,
    pub basic_pods: Result<PodsResult, ClientError>,
    pub stats_delay: Duration,
    pub rich_delay: Duration,
    pub basic_delay: Duration,
    pub panic_on_stats: bool,
}

impl NodeScript {
    pub fn healthy(stats: NodeStats) -> Self {
        Self {
            stats: Ok(stats),
            rich_pods: Ok(PodsResult::default()),
            basic_pods: Ok(PodsResult::default()),
            stats_delay: Duration::ZERO,
            rich_delay: Duration::ZERO,
            basic_delay: Duration::ZERO,
            panic_on_stats: false,
        }
    }

    pub fn failing(error: ClientError) -> Self {
        Self {
            stats: Err(error.clone()),
            rich_pods: Err(error.clone()),
            basic_pods: Err(error),
            stats_delay: Duration::ZERO,
            rich_delay: Duration::ZERO,
            basic_delay: Duration::ZERO,
            panic_on_stats: false,
        }
    }

    /// Same delay on every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.stats_delay = delay;
        self.rich_delay = delay;
        self.basic_delay = delay;
        self
    }

    pub fn with_rich_delay(mut self, delay: Duration) -> Self {
        self.rich_delay = delay;
        self
    }

    pub fn with_rich_pods(mut self, pods: Result<PodsResult, ClientError>) -> Self {
        self.rich_pods = pods;
        self
    }

    pub fn with_basic_pods(mut self, pods: Result<PodsResult, ClientError>) -> Self {
        self.basic_pods = pods;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_stats = true;
        self
    }
}

/// In-memory NodeClient. Unknown addresses fail with a transport error.
#[derive(Default)]
pub struct FakeNodeClient {
    scripts: Mutex<HashMap<String, NodeScript>>,
    calls: Mutex<Vec<(String, &'static str)>>,
    stats_in_flight: AtomicUsize,
    max_stats_in_flight: AtomicUsize,
}

impl FakeNodeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(self, address: &str, script: NodeScript) -> Self {
        self.set_node(address, script);
        self
    }

    pub fn set_node(&self, address: &str, script: NodeScript) {
        self.scripts
            .lock()
            .unwrap()
            .insert(address.to_string(), script);
    }

    pub fn calls(&self) -> Vec<(String, &'static str)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, address: &str, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(a, m)| a == address && *m == method)
            .count()
    }

    /// Highest number of simultaneous get_stats calls observed.
    pub fn max_stats_in_flight(&self) -> usize {
        self.max_stats_in_flight.load(Ordering::SeqCst)
    }

    fn script(&self, address: &str, method: &'static str) -> Option<NodeScript> {
        self.calls
            .lock()
            .unwrap()
            .push((address.to_string(), method));
        self.scripts.lock().unwrap().get(address).cloned()
    }
}

fn unreachable(address: &str) -> ClientError {
    ClientError::Transport(format!("connection refused: {}", address))
}

#[async_trait]
impl NodeClient for FakeNodeClient {
    async fn get_stats(&self, address: &str) -> Result<NodeStats, ClientError> {
        let Some(script) = self.script(address, "get-stats") else {
            return Err(unreachable(address));
        };
        let now = self.stats_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_stats_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(script.stats_delay).await;
        self.stats_in_flight.fetch_sub(1, Ordering::SeqCst);
        if script.panic_on_stats {
            panic!("scripted panic for {}", address);
        }
        script.stats
    }

    async fn get_pods_with_stats(&self, address: &str) -> Result<PodsResult, ClientError> {
        let Some(script) = self.script(address, "get-pods-with-stats") else {
            return Err(unreachable(address));
        };
        tokio::time::sleep(script.rich_delay).await;
        script.rich_pods
    }

    async fn get_pods(&self, address: &str) -> Result<PodsResult, ClientError> {
        let Some(script) = self.script(address, "get-pods") else {
            return Err(unreachable(address));
        };
        tokio::time::sleep(script.basic_delay).await;
        script.basic_pods
    }
}
