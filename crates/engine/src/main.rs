use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;

use courtside_engine::chat::{ChatEngine, SessionManager};
use courtside_engine::config;
use courtside_engine::routes::{self, AppState};
use courtside_engine::stats::{StatsClient, StatsSource};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Courtside engine starting");

    // Load configuration — fail loudly on misconfiguration.
    let config_dir = std::env::var("COURTSIDE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let engine_config = match config::load_config(&config_dir) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration — refusing to start");
            std::process::exit(1);
        }
    };

    // Install Prometheus metrics recorder.
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    let stats: Arc<dyn StatsSource> = match StatsClient::new(&engine_config.system.stats) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            let e = courtside_common::CourtsideError::from(e);
            tracing::error!(error = %e, "Failed to build stats provider client");
            std::process::exit(1);
        }
    };

    let engine = match ChatEngine::new(&engine_config, stats) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build chat engine");
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState {
        engine,
        sessions: SessionManager::new(),
        metrics_handle,
    });

    let app = routes::router(state);

    let port: u16 = std::env::var("COURTSIDE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind TCP listener");

    tracing::info!(port = port, "Courtside engine listening");

    axum::serve(listener, app).await.expect("HTTP server error");
}
