// Discovery: seed peer list merged with the static address set into one working set

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::instrument;

use crate::client::{NodeClient, PeerListing, negotiate_peers};
use crate::models::PodsResult;

/// How a discovered peer address is compared against configured addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressIdentity {
    /// Drop the port: "10.0.0.3:9001" and "10.0.0.3" are the same node.
    #[default]
    Host,
    /// Addresses are opaque strings; distinct ports are distinct nodes.
    HostPort,
}

impl AddressIdentity {
    pub fn normalize(self, address: &str) -> String {
        let address = address.trim();
        match self {
            AddressIdentity::HostPort => address.to_string(),
            AddressIdentity::Host => {
                if let Ok(sock) = address.parse::<SocketAddr>() {
                    sock.ip().to_string()
                } else if address.parse::<IpAddr>().is_ok() {
                    address.to_string()
                } else {
                    address.split(':').next().unwrap_or(address).to_string()
                }
            }
        }
    }
}

/// Working set for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Static addresses first (configured order), then newly discovered ones.
    pub working_set: Vec<String>,
    /// Seed's `total_count`; `None` when discovery failed or was skipped.
    pub total_reported: Option<u64>,
}

/// Unions the static set with the seed's peers. Duplicates collapse, first occurrence wins.
///
/// Identity is compared on normalized addresses for both sides, so a static
/// `10.0.0.3:6000` and a discovered `10.0.0.3:9001` are one node under
/// [`AddressIdentity::Host`]. Static entries keep their configured spelling;
/// discovered ones are added normalized.
pub fn merge_addresses(
    static_addresses: &[String],
    discovered: Option<&PodsResult>,
    identity: AddressIdentity,
) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut working_set = Vec::with_capacity(
        static_addresses.len() + discovered.map_or(0, |d| d.pods.len()),
    );

    for address in static_addresses {
        if seen.insert(identity.normalize(address)) {
            working_set.push(address.clone());
        }
    }

    for peer in discovered.into_iter().flat_map(|d| d.pods.iter()) {
        let address = identity.normalize(&peer.address);
        if address.is_empty() {
            continue;
        }
        if seen.insert(address.clone()) {
            working_set.push(address);
        }
    }
    working_set
}

/// Asks `seed` for its peers once and merges them into `static_addresses`.
///
/// Each peer call is bounded by `timeout`. A discovery failure degrades to the static set.
#[instrument(skip(client, static_addresses), fields(operation = "resolve", static_count = static_addresses.len()))]
pub async fn resolve<C>(
    client: &C,
    seed: Option<&str>,
    static_addresses: &[String],
    identity: AddressIdentity,
    timeout: Duration,
) -> Resolution
where
    C: NodeClient + ?Sized,
{
    let discovered = match seed {
        Some(seed) => match negotiate_peers(client, seed, timeout).await {
            PeerListing::Failed(e) => {
                tracing::warn!(seed, error = %e, "seed discovery failed; using static addresses");
                None
            }
            listing => {
                tracing::debug!(seed, listing = listing.kind(), "seed discovery succeeded");
                listing.into_result().ok()
            }
        },
        None => None,
    };

    let working_set = merge_addresses(static_addresses, discovered.as_ref(), identity);
    Resolution {
        working_set,
        total_reported: discovered.map(|d| d.total_count),
    }
}
