//! TrafficScope Core Library
//!
//! This crate provides the ring-track data model, the wrap-aware speed
//! estimator, the bounded sample window and the session state machine that
//! ties them to a simulation backend.

pub mod backend;
pub mod error;
pub mod estimator;
pub mod model;
pub mod session;
pub mod units;
pub mod window;

pub use backend::SimulationBackend;
pub use error::SyncError;
pub use model::{Provisioned, Snapshot, SpeedSample, TrackGeometry, Vehicle, VehicleId};
pub use session::{RefreshOutcome, RefreshTicket, SyncSession};
pub use units::{Hertz, PixelsPerSecond};
pub use window::SampleWindow;
