use anyhow::Result;
use pnode_monitor::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        static_nodes = app_config.nodes.static_addresses.len(),
        seed = ?app_config.nodes.seed_address(),
        refresh_interval_ms = app_config.polling.refresh_interval_ms,
        "{} {} starting",
        version::NAME,
        version::VERSION
    );

    let client: Arc<dyn client::NodeClient> =
        Arc::new(client::PrpcClient::new(&app_config.polling)?);
    let store = Arc::new(scheduler::SnapshotStore::new(
        models::ClusterSnapshot::pending(&app_config.nodes.static_addresses),
    ));
    let status = Arc::new(scheduler::SchedulerStatus::default());
    let (tx, _) = broadcast::channel(app_config.publishing.broadcast_capacity);
    let ws_connections = Arc::new(AtomicUsize::new(0));
    let prefs = Arc::new(prefs::PreferencesStore::load(&app_config.preferences.path).await);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let scheduler_handle = scheduler::spawn(
        scheduler::SchedulerDeps {
            client: client.clone(),
            store: store.clone(),
            status: status.clone(),
            tx: tx.clone(),
            ws_connections: ws_connections.clone(),
            shutdown_rx,
        },
        scheduler::SchedulerConfig::from(&app_config),
    );

    let app = routes::app(
        routes::RouteDeps {
            client,
            store,
            status,
            snapshot_tx: tx,
            ws_connections,
            prefs,
        },
        app_config.clone(),
    );
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = scheduler_handle.await;
        }
    }

    Ok(())
}
