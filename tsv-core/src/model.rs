//! Ring-track data model
//!
//! Wire types for the simulation service plus the derived speed samples.
//! The track is one-dimensional and periodic: a position `x` lives in
//! `[0, extent_x)` and wraps back to zero at the end of the lap.

use crate::estimator;
use crate::units::{Hertz, PixelsPerSecond};
use serde::{Deserialize, Serialize};

/// Identifier the simulation assigns to a vehicle
pub type VehicleId = i64;

/// One vehicle as reported by the simulation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,

    /// Position vector in model space; only the first component is used
    #[serde(default)]
    pub pos: Vec<f64>,
}

impl Vehicle {
    pub fn new(id: VehicleId, x: f64) -> Self {
        Self { id, pos: vec![x] }
    }

    /// Position along the ring, if the service reported one
    pub fn position(&self) -> Option<f64> {
        self.pos.first().copied()
    }
}

/// Current state of a simulation, returned by every poll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cars: Vec<Vehicle>,
}

impl Snapshot {
    pub fn new(cars: Vec<Vehicle>) -> Self {
        Self { cars }
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.cars.iter().find(|car| car.id == id)
    }

    /// Position of the given vehicle, `None` when absent or position-less
    pub fn position_of(&self, id: VehicleId) -> Option<f64> {
        self.vehicle(id).and_then(Vehicle::position)
    }
}

/// Response to a simulation creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provisioned {
    /// Resource path to poll for subsequent snapshots
    #[serde(rename = "Location")]
    pub location: String,

    /// Initial snapshot
    pub cars: Vec<Vehicle>,
}

impl Provisioned {
    pub fn into_parts(self) -> (String, Snapshot) {
        (self.location, Snapshot::new(self.cars))
    }
}

/// A derived speed observation of the tracked vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    /// 1-based, increases by one per computed sample
    pub index: u64,
    pub value: PixelsPerSecond,
}

/// Geometry of the ring and the vehicle whose motion is sampled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackGeometry {
    /// Circumference of the ring in model units
    pub extent_x: f64,

    /// Screen pixels per model unit
    pub scale_px: f64,

    /// Vehicle that feeds the speed chart
    pub tracked_id: VehicleId,
}

impl TrackGeometry {
    pub const DEFAULT_EXTENT_X: f64 = 25.0;
    pub const DEFAULT_SCALE_PX: f64 = 32.0;
    pub const DEFAULT_TRACKED_ID: VehicleId = 1;

    /// Speed of a vehicle that moved from `prev` to `curr` in one tick
    pub fn estimate(&self, prev: f64, curr: f64, rate: Hertz) -> PixelsPerSecond {
        PixelsPerSecond(estimator::estimate(
            prev,
            curr,
            self.extent_x,
            self.scale_px,
            rate.as_f64(),
        ))
    }
}

impl Default for TrackGeometry {
    fn default() -> Self {
        Self {
            extent_x: Self::DEFAULT_EXTENT_X,
            scale_px: Self::DEFAULT_SCALE_PX,
            tracked_id: Self::DEFAULT_TRACKED_ID,
        }
    }
}
