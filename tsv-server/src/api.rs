//! Control API and SSE routes

use crate::scheduler::SchedulerInfo;
use crate::state::{AppState, ViewSnapshot};
use crate::web_ui;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post, put},
    Json, Router,
};
use futures::stream::{Stream, StreamExt as FuturesStreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;
use tsv_core::{Hertz, SpeedSample, SyncError};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(web_ui::serve_ui))
        .route("/api/setup", post(setup))
        .route("/api/start", post(start))
        .route("/api/stop", post(stop))
        .route("/api/rate", put(set_rate))
        .route("/api/view", get(view))
        .route("/api/samples", get(samples))
        .route("/api/stream", get(update_stream))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// === Session Endpoints ===

/// Provision a fresh simulation and return the reset view
async fn setup(
    State(state): State<AppState>,
) -> Result<Json<ViewSnapshot>, (StatusCode, String)> {
    state.sync.provision().await.map_err(|e| {
        (
            StatusCode::BAD_GATEWAY,
            format!("Failed to set up simulation: {}", e),
        )
    })?;

    Ok(Json(state.view().await))
}

async fn view(State(state): State<AppState>) -> Json<ViewSnapshot> {
    Json(state.view().await)
}

async fn samples(State(state): State<AppState>) -> Json<Vec<SpeedSample>> {
    let session = state.sync.session().read().await;
    Json(session.samples().to_vec())
}

// === Scheduler Endpoints ===

async fn start(
    State(state): State<AppState>,
) -> Result<Json<SchedulerInfo>, (StatusCode, String)> {
    let mut scheduler = state.scheduler.lock().await;
    let rate = scheduler.rate();

    match scheduler.start(rate).await {
        Ok(info) => Ok(Json(info)),
        Err(SyncError::NotProvisioned) => Err((
            StatusCode::CONFLICT,
            "No simulation set up yet. Call /api/setup first.".to_string(),
        )),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

async fn stop(State(state): State<AppState>) -> Json<SchedulerInfo> {
    let mut scheduler = state.scheduler.lock().await;
    scheduler.stop();
    Json(scheduler.info())
}

#[derive(Deserialize)]
struct RateRequest {
    rate_hz: u32,
}

async fn set_rate(
    State(state): State<AppState>,
    Json(request): Json<RateRequest>,
) -> Json<SchedulerInfo> {
    let mut scheduler = state.scheduler.lock().await;
    Json(scheduler.set_rate(Hertz(request.rate_hz)))
}

// === Update Stream Endpoint ===

async fn update_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(update) => match serde_json::to_string(&update) {
                Ok(json) => Some(Ok(Event::default().data(json))),
                Err(e) => {
                    tracing::error!("Failed to serialize update: {}", e);
                    None
                }
            },
            Err(e) => {
                // Lagging clients resync from /api/view
                tracing::warn!("Update stream error: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
