use anyhow::Result;
use campus_marketplace::core::{self, Config};
use campus_marketplace::AppState;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    core::logging::init_logging(&config.monitoring.log_level);

    tracing::info!("🚀 Campus Marketplace starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let status_port = config.monitoring.status_port;
    let app = Arc::new(AppState::build(config).await?);

    // Surface toasts in the log until a UI subscribes
    app.bus.log_notifications();

    app.start().await;

    // Start status endpoint
    let server_app = app.clone();
    tokio::spawn(async move { start_status_server(server_app, status_port).await });

    tracing::info!("✅ Status endpoint running on port {}", status_port);

    let mut status_interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
    status_interval.tick().await;

    loop {
        tokio::select! {
            _ = status_interval.tick() => {
                let status = app.health.get_status().await;
                let market = app.market_status().await;
                tracing::info!(
                    "Marketplace status: {:?} (uptime: {}s) | {} {} open: {}",
                    status.status,
                    status.uptime_seconds,
                    market.snapshot.market_type.emoji(),
                    market.display_name,
                    market.snapshot.is_open
                );
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("🛑 Shutdown requested");
                break;
            }
        }
    }

    app.stop().await;
    Ok(())
}

async fn start_status_server(app: Arc<AppState>, port: u16) {
    use warp::Filter;

    let health_app = app.clone();
    let health = warp::path("health")
        .and(warp::any().map(move || health_app.clone()))
        .and_then(|app: Arc<AppState>| async move {
            let status = app.health.get_status().await;
            Ok::<_, warp::Rejection>(warp::reply::json(&status))
        });

    let market = warp::path("market")
        .and(warp::any().map(move || app.clone()))
        .and_then(|app: Arc<AppState>| async move {
            let status = app.market_status().await;
            Ok::<_, warp::Rejection>(warp::reply::json(&status))
        });

    warp::serve(warp::get().and(health.or(market)))
        .run(([0, 0, 0, 0], port))
        .await;
}
