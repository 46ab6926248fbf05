//! Type-safe wrappers for the units the viewer works in
//!
//! Positions arrive in model units (one lap of the ring is `extent_x` long),
//! speeds are charted in screen pixels per second, and the sampling schedule
//! runs at a whole number of ticks per second.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Round f64 to 4 decimal places for compact JSON serialization
fn round4<S: serde::Serializer>(val: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((*val * 10000.0).round() / 10000.0)
}

/// Pixels per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PixelsPerSecond(#[serde(serialize_with = "round4")] pub f64);

/// Sampling frequency in ticks per second
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hertz(pub u32);

impl Hertz {
    /// Slowest rate the viewer polls at
    pub const MIN: Hertz = Hertz(1);
    /// Fastest rate the viewer polls at
    pub const MAX: Hertz = Hertz(60);

    /// Create a rate, clamping to [`Hertz::MIN`, `Hertz::MAX`]
    pub fn clamped(value: u32) -> Self {
        Self(value.clamp(Self::MIN.0, Self::MAX.0))
    }

    /// Time between two ticks
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.0.max(1) as f64)
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }
}

impl Default for Hertz {
    fn default() -> Self {
        Self(10)
    }
}
