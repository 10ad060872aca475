use serde::Deserialize;

use crate::discovery::AddressIdentity;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub nodes: NodesConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    pub polling: PollingConfig,
    pub publishing: PublishingConfig,
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodesConfig {
    /// Node asked for its peer list each round. Defaults to the first static address.
    #[serde(default)]
    pub seed: Option<String>,
    /// Always-polled addresses, in display order.
    #[serde(default)]
    pub static_addresses: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub address_identity: AddressIdentity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub refresh_interval_ms: u64,
    /// Upper bound for one node's query; keeps every round finite.
    pub node_timeout_ms: u64,
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,
}

fn default_rpc_port() -> u16 {
    6000
}

fn default_rpc_path() -> String {
    "/rpc".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max number of snapshots queued for /ws/snapshot clients (slow clients may lag).
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (online nodes, ws clients, rounds) at INFO level.
    pub stats_log_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesConfig {
    #[serde(default = "default_preferences_path")]
    pub path: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

fn default_preferences_path() -> String {
    "data/preferences.json".into()
}

impl NodesConfig {
    pub fn seed_address(&self) -> Option<&str> {
        self.seed
            .as_deref()
            .or_else(|| self.static_addresses.first().map(String::as_str))
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.nodes.static_addresses.is_empty() || self.nodes.seed.is_some(),
            "nodes.static_addresses must be non-empty when nodes.seed is not set"
        );
        if let Some(blank) = self
            .nodes
            .static_addresses
            .iter()
            .position(|a| a.trim().is_empty())
        {
            anyhow::bail!("nodes.static_addresses[{}] must be non-empty", blank);
        }
        if let Some(seed) = &self.nodes.seed {
            anyhow::ensure!(!seed.trim().is_empty(), "nodes.seed must be non-empty");
        }
        anyhow::ensure!(
            self.polling.refresh_interval_ms > 0,
            "polling.refresh_interval_ms must be > 0, got {}",
            self.polling.refresh_interval_ms
        );
        anyhow::ensure!(
            self.polling.node_timeout_ms > 0,
            "polling.node_timeout_ms must be > 0, got {}",
            self.polling.node_timeout_ms
        );
        anyhow::ensure!(
            self.polling.rpc_port > 0,
            "polling.rpc_port must be between 1 and 65535, got {}",
            self.polling.rpc_port
        );
        anyhow::ensure!(
            self.polling.rpc_path.starts_with('/'),
            "polling.rpc_path must start with '/', got {:?}",
            self.polling.rpc_path
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            !self.preferences.path.is_empty(),
            "preferences.path must be non-empty"
        );
        Ok(())
    }
}
