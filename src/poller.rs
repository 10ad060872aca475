// Polling fan-out: one independent, time-bounded query per node, results in input order

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::client::{NodeClient, bounded, negotiate_peers};
use crate::models::NodeResult;

/// Queries one node: stats and peer list concurrently, each call bounded by `timeout`.
///
/// Never fails; every outcome maps to a `NodeResult`. The node is online only
/// when stats answered and one of the two peer calls did. A stats error takes
/// precedence over a peer-list error in the reported message.
pub async fn poll_node<C>(client: &C, address: &str, timeout: Duration) -> NodeResult
where
    C: NodeClient + ?Sized,
{
    let start = Instant::now();
    let (stats, peers) = tokio::join!(
        bounded(timeout, client.get_stats(address)),
        negotiate_peers(client, address, timeout)
    );

    let outcome = stats.and_then(|s| peers.into_result().map(|p| (s, p)));
    match outcome {
        Ok((stats, pods)) => {
            let latency_ms = elapsed_ms(start);
            tracing::debug!(address, latency_ms, operation = "poll_node", "node online");
            NodeResult::online(address, stats, Some(pods), latency_ms)
        }
        Err(e) => {
            if e.is_timeout() {
                tracing::debug!(
                    address,
                    timeout_ms = timeout.as_millis() as u64,
                    operation = "poll_node",
                    "node timed out"
                );
            } else {
                tracing::debug!(address, error = %e, operation = "poll_node", "node offline");
            }
            NodeResult::offline(address, e.to_string())
        }
    }
}

/// Polls every address concurrently and returns once all have settled.
///
/// Each query runs in its own task, so a panic inside one client call only
/// marks that node offline. Output order and length match `addresses`.
pub async fn poll_all<C>(client: Arc<C>, addresses: &[String], timeout: Duration) -> Vec<NodeResult>
where
    C: NodeClient + ?Sized + 'static,
{
    let handles: Vec<_> = addresses
        .iter()
        .cloned()
        .map(|address| {
            let client = client.clone();
            tokio::spawn(async move { poll_node(client.as_ref(), &address, timeout).await })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .zip(addresses)
        .map(|(joined, address)| match joined {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "node query task failed");
                NodeResult::offline(address.as_str(), format!("query task failed: {}", e))
            }
        })
        .collect()
}

fn elapsed_ms(start: Instant) -> u64 {
    (start.elapsed().as_secs_f64() * 1000.0).round() as u64
}
