//! Application state management

use crate::config::ViewerConfig;
use crate::scheduler::{PollScheduler, SchedulerInfo};
use crate::sync::Synchronizer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tsv_core::{SampleWindow, SimulationBackend, SpeedSample, SyncSession, TrackGeometry, Vehicle};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ViewerConfig>,

    /// Session plus the backend it is synchronized with
    pub sync: Synchronizer,

    /// Polling schedule driving refreshes
    pub scheduler: Arc<Mutex<PollScheduler>>,

    /// Broadcast channel for view updates
    /// Multiple consumers can subscribe to redraw on change
    pub updates_tx: broadcast::Sender<ViewUpdate>,
}

/// Incremental change pushed to the UI
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewUpdate {
    /// A new simulation replaced the old one; history starts over
    Provisioned { location: String, cars: Vec<Vehicle> },
    /// A poll replaced the vehicle set, possibly adding a speed sample
    Snapshot {
        cars: Vec<Vehicle>,
        sample: Option<SpeedSample>,
    },
    Scheduler(SchedulerInfo),
}

/// Full view of the session for clients that just connected
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub backend: String,
    pub location: Option<String>,
    pub geometry: TrackGeometry,
    pub cars: Vec<Vehicle>,
    pub samples: Vec<SpeedSample>,
    pub window_capacity: usize,
    pub scheduler: SchedulerInfo,
    pub last_update: Option<DateTime<Utc>>,
}

impl AppState {
    pub fn new(config: ViewerConfig, backend: Arc<dyn SimulationBackend>) -> Self {
        // Create broadcast channel with capacity for 256 updates
        let (updates_tx, _) = broadcast::channel(256);

        let session = SyncSession::with_window(
            config.geometry,
            SampleWindow::with_capacity(config.window_capacity),
        );
        let sync = Synchronizer::new(session, backend, updates_tx.clone());
        let scheduler = PollScheduler::new(sync.clone(), config.rate);

        Self {
            config: Arc::new(config),
            sync,
            scheduler: Arc::new(Mutex::new(scheduler)),
            updates_tx,
        }
    }

    /// Subscribe to view updates
    pub fn subscribe(&self) -> broadcast::Receiver<ViewUpdate> {
        self.updates_tx.subscribe()
    }

    pub async fn view(&self) -> ViewSnapshot {
        let scheduler = self.scheduler.lock().await.info();
        let session = self.sync.session().read().await;

        ViewSnapshot {
            backend: self.sync.backend_name().to_string(),
            location: session.location().map(str::to_string),
            geometry: *session.geometry(),
            cars: session.cars().to_vec(),
            samples: session.samples().to_vec(),
            window_capacity: session.samples().capacity(),
            scheduler,
            last_update: session.last_update(),
        }
    }
}
