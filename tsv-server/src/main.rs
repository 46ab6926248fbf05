//! TrafficScope Server
//!
//! Viewer application with web UI and control API

use anyhow::Result;
use std::sync::Arc;
use tsv_backends::{DemoBackend, DemoConfig, HttpBackend};
use tsv_core::SimulationBackend;
use tsv_server::{api, config::ViewerConfig, state};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting TrafficScope Server");

    let config = ViewerConfig::from_env()?;

    let backend: Arc<dyn SimulationBackend> = if config.demo {
        info!("Using in-process demo simulation");
        Arc::new(DemoBackend::with_config(DemoConfig {
            extent_x: config.geometry.extent_x,
            tracked_id: config.geometry.tracked_id,
            ..DemoConfig::default()
        }))
    } else {
        info!("Using simulation service at {}", config.backend_url);
        Arc::new(HttpBackend::with_timeout(
            config.backend_url.clone(),
            config.request_timeout,
        ))
    };

    let addr = config.listen;

    // Create application state
    let state = state::AppState::new(config, backend);

    // Build the router
    let app = api::create_router(state);

    // Start server
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
