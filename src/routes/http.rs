// GET/PUT handlers: version, health, node forwarding, views, summary, preferences

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::AppState;
use crate::aggregate::{CpuLoadPoint, StorageShare, cpu_distribution, storage_share};
use crate::client::negotiate_peers;
use crate::format::{CPU_HOT_PERCENT, LatencyClass, error_label, format_bytes, format_uptime};
use crate::models::{ClusterAggregates, NodeResult};
use crate::poller::poll_node;
use crate::prefs::Theme;
use crate::scheduler::{now_ms, seconds_until_refresh};
use crate::version::{NAME, VERSION};
use crate::view::{ViewQuery, view};

const MISSING_ADDRESS: &str = "Missing ip parameter";

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/health
pub(super) async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn missing_address() -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": MISSING_ADDRESS }))).into_response()
}

fn bad_gateway(address: &str, error: impl std::fmt::Display) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "ip": address, "error": error.to_string() })),
    )
        .into_response()
}

/// GET /api/node-info and /api/pods-from-seed without an address.
pub(super) async fn missing_address_handler() -> Response {
    missing_address()
}

fn node_timeout(state: &AppState) -> Duration {
    Duration::from_millis(state.config.polling.node_timeout_ms)
}

/// GET /api/node-info/{address} — live stats + peers for one node; 502 unless both answered.
pub(super) async fn node_info_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Response {
    let address = address.trim();
    if address.is_empty() {
        return missing_address();
    }

    let result = poll_node(state.client.as_ref(), address, node_timeout(&state)).await;
    match (result.stats(), result.error()) {
        (Some(stats), _) => Json(json!({
            "ip": address,
            "stats": stats,
            "pods": result.pods(),
            "status": result.status(),
            "latency_ms": result.latency_ms(),
        }))
        .into_response(),
        (None, error) => bad_gateway(address, error.unwrap_or("Unknown error")),
    }
}

/// GET /api/pods-from-seed/{address} — the node's peer list (rich, else basic).
pub(super) async fn pods_from_seed_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Response {
    let address = address.trim();
    if address.is_empty() {
        return missing_address();
    }

    match negotiate_peers(state.client.as_ref(), address, node_timeout(&state))
        .await
        .into_result()
    {
        Ok(pods) => Json(pods).into_response(),
        Err(e) => bad_gateway(address, e),
    }
}

/// One row of GET /api/nodes: the raw result plus display hints.
#[derive(Debug, Serialize)]
struct NodeRow {
    #[serde(flatten)]
    result: NodeResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_class: Option<LatencyClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uptime_display: Option<String>,
    cpu_hot: bool,
}

impl From<NodeResult> for NodeRow {
    fn from(result: NodeResult) -> Self {
        let error_label = result.error().map(error_label);
        let latency_class = result
            .is_online()
            .then(|| LatencyClass::from_ms(result.latency_ms()));
        let uptime_display = result.stats().map(|s| format_uptime(s.uptime));
        let cpu_hot = result
            .stats()
            .is_some_and(|s| s.cpu_percent > CPU_HOT_PERCENT);
        Self {
            result,
            error_label,
            latency_class,
            uptime_display,
            cpu_hot,
        }
    }
}

/// GET /api/nodes?status=&search=&sort= — filtered, ranked view of the latest snapshot.
pub(super) async fn nodes_handler(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> impl IntoResponse {
    let snapshot = state.store.current().await;
    let rows: Vec<NodeRow> = view(&snapshot.nodes, &query)
        .into_iter()
        .map(NodeRow::from)
        .collect();
    Json(json!({
        "completed_at": snapshot.completed_at,
        "count": rows.len(),
        "nodes": rows,
    }))
}

#[derive(Debug, Serialize)]
struct Summary {
    aggregates: ClusterAggregates,
    total_storage_display: String,
    total_reported: Option<u64>,
    static_node_count: usize,
    last_refreshed: Option<u64>,
    seconds_until_refresh: Option<u64>,
    refresh_interval_ms: u64,
    /// No round has completed yet.
    syncing: bool,
    round_in_flight: bool,
    rounds_completed: u64,
    cpu_distribution: Vec<CpuLoadPoint>,
    storage_share: Vec<StorageShare>,
}

/// GET /api/summary — cluster totals, refresh timing and chart series.
pub(super) async fn summary_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.store.current().await;
    let refresh_interval_ms = state.config.polling.refresh_interval_ms;
    Json(Summary {
        aggregates: snapshot.aggregates,
        total_storage_display: format_bytes(snapshot.aggregates.total_storage),
        total_reported: snapshot.total_reported,
        static_node_count: state.config.nodes.static_addresses.len(),
        last_refreshed: snapshot.completed_at,
        seconds_until_refresh: seconds_until_refresh(
            snapshot.completed_at,
            refresh_interval_ms,
            now_ms(),
        ),
        refresh_interval_ms,
        syncing: !snapshot.is_complete(),
        round_in_flight: state.status.in_flight(),
        rounds_completed: state.status.rounds_completed(),
        cpu_distribution: cpu_distribution(&snapshot.nodes),
        storage_share: storage_share(&snapshot.nodes),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ThemeBody {
    theme: Theme,
}

/// GET /api/preferences/theme
pub(super) async fn get_theme_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(ThemeBody {
        theme: state.prefs.get().await.theme,
    })
}

/// PUT /api/preferences/theme — persists across restarts.
pub(super) async fn put_theme_handler(
    State(state): State<AppState>,
    Json(body): Json<ThemeBody>,
) -> Response {
    match state.prefs.set_theme(body.theme).await {
        Ok(prefs) => Json(ThemeBody { theme: prefs.theme }).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, operation = "set_theme", "failed to persist preferences");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
