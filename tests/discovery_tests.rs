// Discovery tests: seed peer list merged with the static set

mod common;

use common::*;
use pnode_monitor::client::ClientError;
use pnode_monitor::discovery::{AddressIdentity, merge_addresses, resolve};
use tokio::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn static_set() -> Vec<String> {
    vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()]
}

#[tokio::test]
async fn seed_peers_are_appended_after_static_addresses() {
    let client = FakeNodeClient::new().with_node(
        "10.0.0.1",
        NodeScript::healthy(stats(1.0, 1, 0, 0))
            .with_rich_pods(Ok(pods(&["10.0.0.3:9001"], 5))),
    );

    let r = resolve(
        &client,
        Some("10.0.0.1"),
        &static_set(),
        AddressIdentity::Host,
        TIMEOUT,
    )
    .await;

    assert_eq!(r.working_set, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    assert_eq!(r.total_reported, Some(5));
}

#[tokio::test]
async fn failed_discovery_keeps_static_set_exactly() {
    let client = FakeNodeClient::new().with_node(
        "10.0.0.1",
        NodeScript::failing(ClientError::Transport("connection reset".into())),
    );

    let r = resolve(
        &client,
        Some("10.0.0.1"),
        &static_set(),
        AddressIdentity::Host,
        TIMEOUT,
    )
    .await;

    assert_eq!(r.working_set, static_set());
    assert_eq!(r.total_reported, None);
}

#[tokio::test]
async fn discovery_falls_back_to_basic_peer_list() {
    let client = FakeNodeClient::new().with_node(
        "10.0.0.1",
        NodeScript::healthy(stats(1.0, 1, 0, 0))
            .with_rich_pods(Err(ClientError::Rpc {
                code: -32601,
                message: "Method not found".into(),
            }))
            .with_basic_pods(Ok(pods(&["10.0.0.9:9001"], 12))),
    );

    let r = resolve(
        &client,
        Some("10.0.0.1"),
        &static_set(),
        AddressIdentity::Host,
        TIMEOUT,
    )
    .await;

    assert_eq!(r.working_set, vec!["10.0.0.1", "10.0.0.2", "10.0.0.9"]);
    assert_eq!(r.total_reported, Some(12));
    assert_eq!(client.call_count("10.0.0.1", "get-pods-with-stats"), 1);
    assert_eq!(client.call_count("10.0.0.1", "get-pods"), 1);
}

#[tokio::test]
async fn seed_is_queried_exactly_once_when_rich_call_succeeds() {
    let client = FakeNodeClient::new().with_node(
        "10.0.0.1",
        NodeScript::healthy(stats(1.0, 1, 0, 0)).with_rich_pods(Ok(pods(&[], 0))),
    );

    resolve(
        &client,
        Some("10.0.0.1"),
        &static_set(),
        AddressIdentity::Host,
        TIMEOUT,
    )
    .await;

    assert_eq!(client.call_count("10.0.0.1", "get-pods-with-stats"), 1);
    assert_eq!(client.call_count("10.0.0.1", "get-pods"), 0);
    assert_eq!(client.call_count("10.0.0.1", "get-stats"), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_seed_times_out_into_static_set() {
    let client = FakeNodeClient::new().with_node(
        "10.0.0.1",
        NodeScript::healthy(stats(1.0, 1, 0, 0))
            .with_rich_pods(Ok(pods(&["10.0.0.3:9001"], 5)))
            .with_delay(Duration::from_secs(60)),
    );

    let r = resolve(
        &client,
        Some("10.0.0.1"),
        &static_set(),
        AddressIdentity::Host,
        Duration::from_secs(1),
    )
    .await;

    assert_eq!(r.working_set, static_set());
    assert_eq!(r.total_reported, None);
}

#[tokio::test(start_paused = true)]
async fn hung_rich_seed_call_still_discovers_through_basic_list() {
    let client = FakeNodeClient::new().with_node(
        "10.0.0.1",
        NodeScript::healthy(stats(1.0, 1, 0, 0))
            .with_rich_pods(Err(ClientError::Timeout))
            .with_rich_delay(Duration::from_secs(2))
            .with_basic_pods(Ok(pods(&["10.0.0.8:9001"], 4))),
    );

    let r = resolve(
        &client,
        Some("10.0.0.1"),
        &static_set(),
        AddressIdentity::Host,
        Duration::from_secs(1),
    )
    .await;

    assert_eq!(r.total_reported, Some(4));
    assert_eq!(r.working_set, vec!["10.0.0.1", "10.0.0.2", "10.0.0.8"]);
}

#[tokio::test]
async fn no_seed_skips_discovery() {
    let client = FakeNodeClient::new();
    let r = resolve(&client, None, &static_set(), AddressIdentity::Host, TIMEOUT).await;
    assert_eq!(r.working_set, static_set());
    assert_eq!(r.total_reported, None);
    assert!(client.calls().is_empty());
}

#[test]
fn total_reported_may_exceed_working_set() {
    let discovered = pods(&["10.0.0.1:9001"], 250);
    let merged = merge_addresses(&static_set(), Some(&discovered), AddressIdentity::Host);
    assert_eq!(merged.len(), 2);
}

#[test]
fn duplicates_collapse_in_first_seen_order() {
    let static_addresses = vec![
        "10.0.0.2".to_string(),
        "10.0.0.1".to_string(),
        "10.0.0.2".to_string(),
    ];
    let discovered = pods(
        &["10.0.0.5:9001", "10.0.0.1:9001", "10.0.0.4:9001", "10.0.0.5:9002"],
        4,
    );
    let merged = merge_addresses(&static_addresses, Some(&discovered), AddressIdentity::Host);
    assert_eq!(merged, vec!["10.0.0.2", "10.0.0.1", "10.0.0.5", "10.0.0.4"]);
}

#[test]
fn host_identity_matches_static_entries_with_ports() {
    let static_addresses = vec!["10.0.0.3:6000".to_string(), "10.0.0.1".to_string()];
    let discovered = pods(&["10.0.0.3:9001", "10.0.0.5:9001"], 2);
    let merged = merge_addresses(&static_addresses, Some(&discovered), AddressIdentity::Host);
    assert_eq!(merged, vec!["10.0.0.3:6000", "10.0.0.1", "10.0.0.5"]);
}

#[test]
fn host_port_identity_keeps_distinct_ports() {
    let discovered = pods(&["10.0.0.1:9001", "10.0.0.1:9002"], 2);
    let merged = merge_addresses(&static_set(), Some(&discovered), AddressIdentity::HostPort);
    assert_eq!(
        merged,
        vec!["10.0.0.1", "10.0.0.2", "10.0.0.1:9001", "10.0.0.1:9002"]
    );
}

#[test]
fn blank_peer_addresses_are_ignored() {
    let discovered = pods(&["", "  "], 2);
    let merged = merge_addresses(&static_set(), Some(&discovered), AddressIdentity::Host);
    assert_eq!(merged, static_set());
}
