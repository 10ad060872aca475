// Round scheduler: discovery -> fan-out poll -> aggregate, once on start and then every interval.
// A round runs inside the tick branch, so rounds never overlap; missed ticks are skipped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{RwLock, broadcast};
use tokio::time::{Duration, Instant, interval};
use tracing::{Instrument, instrument};

use crate::client::NodeClient;
use crate::config::AppConfig;
use crate::discovery::{AddressIdentity, resolve};
use crate::models::ClusterSnapshot;
use crate::poller::poll_all;

/// Rate limit for "no receivers" logging (avoid logging every round when no one is on /ws/snapshot)
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Holds the latest published snapshot. Readers clone the `Arc` and keep a whole round.
pub struct SnapshotStore {
    current: RwLock<Arc<ClusterSnapshot>>,
}

impl SnapshotStore {
    pub fn new(initial: ClusterSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub async fn current(&self) -> Arc<ClusterSnapshot> {
        self.current.read().await.clone()
    }

    /// Replaces the snapshot in one swap; the previous one is dropped once its readers finish.
    pub async fn publish(&self, snapshot: Arc<ClusterSnapshot>) {
        *self.current.write().await = snapshot;
    }
}

/// Live scheduler state for presentation ("syncing" vs "live", round counter).
#[derive(Debug, Default)]
pub struct SchedulerStatus {
    in_flight: AtomicBool,
    rounds_completed: AtomicU64,
}

impl SchedulerStatus {
    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed.load(Ordering::Relaxed)
    }
}

/// Whole seconds until the next refresh, counted from the last completed round.
/// `None` until a round has completed.
pub fn seconds_until_refresh(
    completed_at_ms: Option<u64>,
    refresh_interval_ms: u64,
    now_ms: u64,
) -> Option<u64> {
    completed_at_ms.map(|done| {
        let elapsed = now_ms.saturating_sub(done);
        refresh_interval_ms.saturating_sub(elapsed) / 1000
    })
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}

/// What one round polls.
#[derive(Debug, Clone)]
pub struct RoundConfig {
    pub seed: Option<String>,
    pub static_addresses: Vec<String>,
    pub identity: AddressIdentity,
    pub node_timeout: Duration,
}

impl From<&AppConfig> for RoundConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            seed: config.nodes.seed_address().map(str::to_string),
            static_addresses: config.nodes.static_addresses.clone(),
            identity: config.discovery.address_identity,
            node_timeout: Duration::from_millis(config.polling.node_timeout_ms),
        }
    }
}

/// Runs one full round and returns its snapshot. Never fails: unreachable nodes
/// come back offline and a failed discovery falls back to the static set.
#[instrument(skip(client, config), fields(operation = "run_round"))]
pub async fn run_round<C>(client: Arc<C>, config: &RoundConfig) -> ClusterSnapshot
where
    C: NodeClient + ?Sized + 'static,
{
    let resolution = resolve(
        client.as_ref(),
        config.seed.as_deref(),
        &config.static_addresses,
        config.identity,
        config.node_timeout,
    )
    .await;

    let nodes = poll_all(client, &resolution.working_set, config.node_timeout).await;
    ClusterSnapshot::new(nodes, resolution.total_reported, now_ms())
}

/// Client, snapshot sinks and shutdown for the scheduler.
pub struct SchedulerDeps<C: ?Sized> {
    pub client: Arc<C>,
    pub store: Arc<SnapshotStore>,
    pub status: Arc<SchedulerStatus>,
    pub tx: broadcast::Sender<Arc<ClusterSnapshot>>,
    pub ws_connections: Arc<AtomicUsize>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Scheduler timing and logging config.
pub struct SchedulerConfig {
    pub round: RoundConfig,
    pub refresh_interval_ms: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

impl From<&AppConfig> for SchedulerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            round: RoundConfig::from(config),
            refresh_interval_ms: config.polling.refresh_interval_ms,
            stats_log_interval_secs: config.monitoring.stats_log_interval_secs,
        }
    }
}

pub fn spawn<C>(deps: SchedulerDeps<C>, config: SchedulerConfig) -> tokio::task::JoinHandle<()>
where
    C: NodeClient + ?Sized + 'static,
{
    let SchedulerDeps {
        client,
        store,
        status,
        tx,
        ws_connections,
        mut shutdown_rx,
    } = deps;
    let SchedulerConfig {
        round,
        refresh_interval_ms,
        stats_log_interval_secs,
    } = config;

    let scheduler_span = tracing::span!(tracing::Level::DEBUG, "scheduler", refresh_interval_ms);

    let task = async move {
        // First tick completes immediately: the initial round runs on start.
        let mut tick = interval(Duration::from_millis(refresh_interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut last_no_receivers_warn: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    status.in_flight.store(true, Ordering::Relaxed);
                    let started = Instant::now();
                    let snapshot = Arc::new(run_round(client.clone(), &round).await);
                    store.publish(snapshot.clone()).await;
                    status.in_flight.store(false, Ordering::Relaxed);
                    let rounds = status.rounds_completed.fetch_add(1, Ordering::Relaxed) + 1;

                    tracing::info!(
                        round = rounds,
                        online = snapshot.aggregates.online,
                        total = snapshot.aggregates.total,
                        gossip_total = ?snapshot.total_reported,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "round complete"
                    );

                    if tx.send(snapshot).is_err() {
                        let should_warn = last_no_receivers_warn
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                        if should_warn {
                            tracing::debug!(
                                operation = "broadcast_snapshot",
                                "No active WebSocket clients; broadcast channel has no receivers"
                            );
                            last_no_receivers_warn = Some(Instant::now());
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Scheduler shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    let snapshot = store.current().await;
                    tracing::info!(
                        ws_snapshot_clients = ws_connections.load(Ordering::Relaxed),
                        rounds_completed = status.rounds_completed(),
                        nodes_online = snapshot.aggregates.online,
                        nodes_total = snapshot.aggregates.total,
                        "app stats"
                    );
                }
            }
        }
    };
    tokio::spawn(task.instrument(scheduler_span))
}
