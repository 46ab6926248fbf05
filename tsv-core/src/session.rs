//! Simulation session state
//!
//! `SyncSession` owns everything the viewer knows about the simulation it is
//! following: where to poll it, the latest vehicle set, the last observed
//! position of the tracked vehicle and the speed samples derived so far.
//!
//! Refreshing is split into [`SyncSession::begin_refresh`] and
//! [`SyncSession::apply_snapshot`] so a shared session never has to be
//! locked across a network round trip. Every ticket carries the provisioning
//! generation it was issued under; a response that lands after a newer
//! provisioning is rejected instead of being mixed into the new history.

use crate::backend::SimulationBackend;
use crate::error::SyncError;
use crate::model::{Provisioned, Snapshot, SpeedSample, TrackGeometry, Vehicle};
use crate::units::Hertz;
use crate::window::SampleWindow;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Last observed position of the tracked vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
struct PreviousPosition {
    x: f64,
    /// Taken from the provisioning snapshot and not yet compared against
    seeded: bool,
}

/// Permission to apply one fetched snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    location: String,
    generation: u64,
}

impl RefreshTicket {
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What a successfully applied snapshot did to the speed history
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshOutcome {
    /// A new sample was appended
    Sampled(SpeedSample),
    /// First sighting of the tracked vehicle, nothing to compare against yet
    Seeded,
    /// Tracked vehicle is still where provisioning saw it
    Unchanged,
    /// Tracked vehicle missing from the snapshot
    TrackedAbsent,
}

impl RefreshOutcome {
    pub fn sample(&self) -> Option<SpeedSample> {
        match self {
            RefreshOutcome::Sampled(sample) => Some(*sample),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncSession {
    geometry: TrackGeometry,
    location: Option<String>,
    cars: Vec<Vehicle>,
    window: SampleWindow,
    previous: Option<PreviousPosition>,
    last_index: u64,
    generation: u64,
    last_update: Option<DateTime<Utc>>,
}

impl SyncSession {
    pub fn new(geometry: TrackGeometry) -> Self {
        Self::with_window(geometry, SampleWindow::new())
    }

    pub fn with_window(geometry: TrackGeometry, window: SampleWindow) -> Self {
        Self {
            geometry,
            location: None,
            cars: Vec::new(),
            window,
            previous: None,
            last_index: 0,
            generation: 0,
            last_update: None,
        }
    }

    pub fn geometry(&self) -> &TrackGeometry {
        &self.geometry
    }

    pub fn is_provisioned(&self) -> bool {
        self.location.is_some()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn cars(&self) -> &[Vehicle] {
        &self.cars
    }

    pub fn samples(&self) -> &SampleWindow {
        &self.window
    }

    /// Last observed position of the tracked vehicle
    pub fn previous_position(&self) -> Option<f64> {
        self.previous.map(|p| p.x)
    }

    /// Number of successful provisionings so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the vehicle set was last replaced
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Adopt a freshly created simulation, discarding all derived history
    pub fn apply_provisioned(&mut self, provisioned: Provisioned) {
        let (location, snapshot) = provisioned.into_parts();

        self.generation += 1;
        self.window.reset();
        self.last_index = 0;
        self.previous = snapshot
            .position_of(self.geometry.tracked_id)
            .map(|x| PreviousPosition { x, seeded: true });
        self.cars = snapshot.cars;
        self.location = Some(location);
        self.last_update = Some(Utc::now());
    }

    /// Issue a ticket for fetching the next snapshot
    pub fn begin_refresh(&self) -> Result<RefreshTicket, SyncError> {
        let location = self.location.clone().ok_or(SyncError::NotProvisioned)?;
        Ok(RefreshTicket {
            location,
            generation: self.generation,
        })
    }

    /// Apply a snapshot fetched under `ticket`, sampled at `rate`
    pub fn apply_snapshot(
        &mut self,
        ticket: &RefreshTicket,
        snapshot: Snapshot,
        rate: Hertz,
    ) -> Result<RefreshOutcome, SyncError> {
        if ticket.generation != self.generation {
            return Err(SyncError::StaleResponse {
                expected: self.generation,
                actual: ticket.generation,
            });
        }

        let current = snapshot.position_of(self.geometry.tracked_id);
        self.cars = snapshot.cars;
        self.last_update = Some(Utc::now());

        let Some(curr) = current else {
            return Ok(RefreshOutcome::TrackedAbsent);
        };

        let outcome = match self.previous {
            None => RefreshOutcome::Seeded,
            Some(prev) if prev.seeded && prev.x == curr => {
                return Ok(RefreshOutcome::Unchanged);
            }
            Some(prev) => {
                self.last_index += 1;
                let sample = SpeedSample {
                    index: self.last_index,
                    value: self.geometry.estimate(prev.x, curr, rate),
                };
                self.window.append(sample);
                debug!(index = sample.index, speed = sample.value.0, "speed sample");
                RefreshOutcome::Sampled(sample)
            }
        };

        self.previous = Some(PreviousPosition {
            x: curr,
            seeded: false,
        });
        Ok(outcome)
    }

    /// Create a new simulation through `backend` and adopt it
    ///
    /// On failure the session is left untouched.
    pub async fn provision<B>(&mut self, backend: &B) -> Result<(), SyncError>
    where
        B: SimulationBackend + ?Sized,
    {
        let provisioned = backend.create_simulation().await?;
        self.apply_provisioned(provisioned);
        Ok(())
    }

    /// Fetch and apply the current snapshot through `backend`
    pub async fn refresh<B>(&mut self, backend: &B, rate: Hertz) -> Result<RefreshOutcome, SyncError>
    where
        B: SimulationBackend + ?Sized,
    {
        let ticket = self.begin_refresh()?;
        let snapshot = backend.fetch_snapshot(ticket.location()).await?;
        self.apply_snapshot(&ticket, snapshot, rate)
    }
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new(TrackGeometry::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provisioned(location: &str, cars: Vec<Vehicle>) -> Provisioned {
        Provisioned {
            location: location.to_string(),
            cars,
        }
    }

    fn snapshot(cars: Vec<Vehicle>) -> Snapshot {
        Snapshot::new(cars)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-6, "expected {expected}, got {actual}");
    }

    #[test]
    fn new_session_is_not_provisioned() {
        let session = SyncSession::default();
        assert!(!session.is_provisioned());
        assert_eq!(session.begin_refresh(), Err(SyncError::NotProvisioned));
    }

    #[test]
    fn end_to_end_wraparound_scenario() {
        let mut session = SyncSession::default();
        session.apply_provisioned(provisioned("/simulations/1", vec![Vehicle::new(1, 5.0)]));
        assert_eq!(session.previous_position(), Some(5.0));

        let ticket = session.begin_refresh().unwrap();
        let first = session
            .apply_snapshot(&ticket, snapshot(vec![Vehicle::new(1, 5.5)]), Hertz(10))
            .unwrap()
            .sample()
            .unwrap();
        assert_eq!(first.index, 1);
        assert_close(first.value.0, 160.0);

        let ticket = session.begin_refresh().unwrap();
        let second = session
            .apply_snapshot(&ticket, snapshot(vec![Vehicle::new(1, 24.7)]), Hertz(10))
            .unwrap()
            .sample()
            .unwrap();
        assert_eq!(second.index, 2);
        assert_close(second.value.0, -1856.0);

        assert_eq!(session.samples().len(), 2);
        assert_eq!(session.previous_position(), Some(24.7));
    }

    #[test]
    fn provision_resets_history_and_reseeds() {
        let mut session = SyncSession::default();
        session.apply_provisioned(provisioned("/simulations/1", vec![Vehicle::new(1, 1.0)]));
        for x in [2.0, 3.0, 4.0] {
            let ticket = session.begin_refresh().unwrap();
            session
                .apply_snapshot(&ticket, snapshot(vec![Vehicle::new(1, x)]), Hertz(10))
                .unwrap();
        }
        assert_eq!(session.samples().len(), 3);

        session.apply_provisioned(provisioned("/simulations/2", vec![Vehicle::new(1, 8.0)]));
        assert!(session.samples().is_empty());
        assert_eq!(session.location(), Some("/simulations/2"));
        assert_eq!(session.previous_position(), Some(8.0));

        let ticket = session.begin_refresh().unwrap();
        let outcome = session
            .apply_snapshot(&ticket, snapshot(vec![Vehicle::new(1, 8.25)]), Hertz(10))
            .unwrap();
        assert_eq!(outcome.sample().map(|s| s.index), Some(1));
    }

    #[test]
    fn unchanged_seed_does_not_emit_a_sample() {
        let mut session = SyncSession::default();
        session.apply_provisioned(provisioned("/simulations/1", vec![Vehicle::new(1, 5.0)]));

        let ticket = session.begin_refresh().unwrap();
        let outcome = session
            .apply_snapshot(&ticket, snapshot(vec![Vehicle::new(1, 5.0)]), Hertz(10))
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::Unchanged);
        assert!(session.samples().is_empty());

        let ticket = session.begin_refresh().unwrap();
        let outcome = session
            .apply_snapshot(&ticket, snapshot(vec![Vehicle::new(1, 5.5)]), Hertz(10))
            .unwrap();
        assert_eq!(outcome.sample().map(|s| s.index), Some(1));

        // Once the seed is consumed a standstill is a real observation.
        let ticket = session.begin_refresh().unwrap();
        let outcome = session
            .apply_snapshot(&ticket, snapshot(vec![Vehicle::new(1, 5.5)]), Hertz(10))
            .unwrap();
        let sample = outcome.sample().unwrap();
        assert_eq!(sample.index, 2);
        assert_close(sample.value.0, 0.0);
    }

    #[test]
    fn tracked_vehicle_absent_updates_cars_only() {
        let mut session = SyncSession::default();
        session.apply_provisioned(provisioned("/simulations/1", vec![Vehicle::new(1, 5.0)]));

        let ticket = session.begin_refresh().unwrap();
        let outcome = session
            .apply_snapshot(&ticket, snapshot(vec![Vehicle::new(2, 3.0)]), Hertz(10))
            .unwrap();

        assert_eq!(outcome, RefreshOutcome::TrackedAbsent);
        assert_eq!(session.cars(), &[Vehicle::new(2, 3.0)]);
        assert_eq!(session.previous_position(), Some(5.0));
        assert!(session.samples().is_empty());
    }

    #[test]
    fn first_sighting_after_absent_seed_only_records_position() {
        let mut session = SyncSession::default();
        session.apply_provisioned(provisioned("/simulations/1", vec![Vehicle::new(2, 3.0)]));
        assert_eq!(session.previous_position(), None);

        let ticket = session.begin_refresh().unwrap();
        let outcome = session
            .apply_snapshot(&ticket, snapshot(vec![Vehicle::new(1, 4.0)]), Hertz(10))
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::Seeded);
        assert_eq!(session.previous_position(), Some(4.0));
        assert!(session.samples().is_empty());
    }

    #[test]
    fn stale_ticket_is_rejected_without_side_effects() {
        let mut session = SyncSession::default();
        session.apply_provisioned(provisioned("/simulations/1", vec![Vehicle::new(1, 5.0)]));
        let stale = session.begin_refresh().unwrap();

        session.apply_provisioned(provisioned("/simulations/2", vec![Vehicle::new(1, 10.0)]));
        let result = session.apply_snapshot(&stale, snapshot(vec![Vehicle::new(1, 6.0)]), Hertz(10));

        assert_eq!(
            result,
            Err(SyncError::StaleResponse {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(session.previous_position(), Some(10.0));
        assert_eq!(session.cars(), &[Vehicle::new(1, 10.0)]);
    }

    #[test]
    fn indices_are_consecutive_from_one() {
        let mut session = SyncSession::default();
        session.apply_provisioned(provisioned("/simulations/1", vec![Vehicle::new(1, 0.0)]));

        for step in 1..=20 {
            let ticket = session.begin_refresh().unwrap();
            let x = (step as f64 * 1.5) % 25.0;
            let cars = if step % 7 == 0 {
                vec![]
            } else {
                vec![Vehicle::new(1, x)]
            };
            session.apply_snapshot(&ticket, snapshot(cars), Hertz(10)).unwrap();
        }

        let indices: Vec<u64> = session.samples().iter().map(|s| s.index).collect();
        let expected: Vec<u64> = (1..=indices.len() as u64).collect();
        assert_eq!(indices, expected);
        assert_eq!(indices.len(), 18);
    }
}
