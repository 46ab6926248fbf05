//! Bounded history of speed samples feeding the chart

use crate::model::SpeedSample;
use serde::Serialize;
use std::collections::VecDeque;

/// Number of samples the chart keeps by default
pub const DEFAULT_CAPACITY: usize = 200;

/// Fixed-capacity, FIFO-evicting sequence of speed samples
///
/// Always holds the most recent `capacity` samples in arrival order.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct SampleWindow {
    samples: VecDeque<SpeedSample>,
    #[serde(skip)]
    capacity: usize,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A zero capacity is raised to one so the latest sample is always kept
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest ones beyond capacity
    pub fn append(&mut self, sample: SpeedSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&SpeedSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpeedSample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<SpeedSample> {
        self.samples.iter().copied().collect()
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new()
    }
}
