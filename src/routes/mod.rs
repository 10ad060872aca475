// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::client::NodeClient;
use crate::config::AppConfig;
use crate::models::ClusterSnapshot;
use crate::prefs::PreferencesStore;
use crate::scheduler::{SchedulerStatus, SnapshotStore};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) client: Arc<dyn NodeClient>,
    pub(crate) store: Arc<SnapshotStore>,
    pub(crate) status: Arc<SchedulerStatus>,
    pub(crate) snapshot_tx: broadcast::Sender<Arc<ClusterSnapshot>>,
    pub(crate) ws_connections: Arc<AtomicUsize>,
    pub(crate) prefs: Arc<PreferencesStore>,
    pub(crate) config: AppConfig,
}

/// Shared handles the router serves from.
pub struct RouteDeps {
    pub client: Arc<dyn NodeClient>,
    pub store: Arc<SnapshotStore>,
    pub status: Arc<SchedulerStatus>,
    pub snapshot_tx: broadcast::Sender<Arc<ClusterSnapshot>>,
    pub ws_connections: Arc<AtomicUsize>,
    pub prefs: Arc<PreferencesStore>,
}

pub fn app(deps: RouteDeps, config: AppConfig) -> Router {
    let RouteDeps {
        client,
        store,
        status,
        snapshot_tx,
        ws_connections,
        prefs,
    } = deps;
    let state = AppState {
        client,
        store,
        status,
        snapshot_tx,
        ws_connections,
        prefs,
        config,
    };
    Router::new()
        .route("/", get(|| async { "pnode-monitor: pRPC cluster monitor" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/health", get(http::health_handler)) // GET /api/health
        .route("/api/node-info", get(http::missing_address_handler))
        .route("/api/node-info/", get(http::missing_address_handler))
        .route("/api/node-info/{address}", get(http::node_info_handler)) // GET /api/node-info/{address}
        .route("/api/pods-from-seed", get(http::missing_address_handler))
        .route("/api/pods-from-seed/", get(http::missing_address_handler))
        .route(
            "/api/pods-from-seed/{address}",
            get(http::pods_from_seed_handler),
        ) // GET /api/pods-from-seed/{address}
        .route("/api/nodes", get(http::nodes_handler)) // GET /api/nodes?status=&search=&sort=
        .route("/api/summary", get(http::summary_handler)) // GET /api/summary
        .route(
            "/api/preferences/theme",
            get(http::get_theme_handler).put(http::put_theme_handler),
        ) // GET/PUT /api/preferences/theme
        .route("/ws/snapshot", get(ws::ws_snapshot)) // WS /ws/snapshot
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
