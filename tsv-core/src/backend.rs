//! Simulation backend trait definition

use crate::error::SyncError;
use crate::model::{Provisioned, Snapshot};
use async_trait::async_trait;

/// Trait for services that host the traffic simulation
///
/// Each backend is responsible for:
/// - Creating a fresh simulation instance and returning where to poll it
/// - Returning the current snapshot of a simulation, advancing it by a tick
///   when the service is stepwise
#[async_trait]
pub trait SimulationBackend: Send + Sync {
    /// Get the name of this backend (e.g., "HTTP", "Demo")
    fn name(&self) -> &str;

    /// Create a new simulation instance
    ///
    /// Returns its location together with the initial snapshot.
    async fn create_simulation(&self) -> Result<Provisioned, SyncError>;

    /// Fetch the current snapshot of the simulation at `location`
    async fn fetch_snapshot(&self, location: &str) -> Result<Snapshot, SyncError>;
}
