//! Shared-session synchronization
//!
//! Runs provisioning and refreshes against the backend without holding the
//! session lock across network calls, and publishes every applied change to
//! the view subscribers.

use crate::state::ViewUpdate;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use tsv_core::{Hertz, RefreshOutcome, SimulationBackend, SyncError, SyncSession};

pub type SharedSession = Arc<RwLock<SyncSession>>;

#[derive(Clone)]
pub struct Synchronizer {
    session: SharedSession,
    backend: Arc<dyn SimulationBackend>,
    updates: broadcast::Sender<ViewUpdate>,
}

impl Synchronizer {
    pub fn new(
        session: SyncSession,
        backend: Arc<dyn SimulationBackend>,
        updates: broadcast::Sender<ViewUpdate>,
    ) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            backend,
            updates,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub async fn is_provisioned(&self) -> bool {
        self.session.read().await.is_provisioned()
    }

    /// Broadcast an update; nobody listening is fine
    pub fn publish(&self, update: ViewUpdate) {
        let _ = self.updates.send(update);
    }

    /// Create a new simulation and reset the session to it
    ///
    /// On failure the session keeps whatever it had before.
    pub async fn provision(&self) -> Result<(), SyncError> {
        let provisioned = match self.backend.create_simulation().await {
            Ok(provisioned) => provisioned,
            Err(e) => {
                warn!("Failed to provision simulation on {}: {}", self.backend.name(), e);
                return Err(e);
            }
        };

        let update = {
            let mut session = self.session.write().await;
            session.apply_provisioned(provisioned);
            ViewUpdate::Provisioned {
                location: session.location().unwrap_or_default().to_string(),
                cars: session.cars().to_vec(),
            }
        };

        if let ViewUpdate::Provisioned { location, cars } = &update {
            info!("Provisioned simulation at {} with {} cars", location, cars.len());
        }
        self.publish(update);
        Ok(())
    }

    /// Fetch the current snapshot and fold it into the session
    pub async fn refresh(&self, rate: Hertz) -> Result<RefreshOutcome, SyncError> {
        let ticket = self.session.read().await.begin_refresh()?;
        let snapshot = self.backend.fetch_snapshot(ticket.location()).await?;

        let (outcome, cars) = {
            let mut session = self.session.write().await;
            let outcome = session.apply_snapshot(&ticket, snapshot, rate)?;
            (outcome, session.cars().to_vec())
        };

        debug!("Applied snapshot with {} cars: {:?}", cars.len(), outcome);
        self.publish(ViewUpdate::Snapshot {
            cars,
            sample: outcome.sample(),
        });
        Ok(outcome)
    }
}
