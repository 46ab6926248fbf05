//! Polling scheduler
//!
//! Drives refreshes of the shared session at the configured rate from a
//! single background task. Ticks never overlap: the task waits for each
//! refresh before taking the next tick, and ticks that pass while a slow
//! request is outstanding are skipped.

use crate::state::ViewUpdate;
use crate::sync::Synchronizer;
use serde::{Deserialize, Serialize};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tsv_core::{Hertz, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerStatus {
    Idle,
    Running,
}

/// Serializable scheduler state for the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerInfo {
    pub status: SchedulerStatus,
    pub rate_hz: Hertz,
}

pub struct PollScheduler {
    sync: Synchronizer,
    rate: Hertz,
    cancel: Option<CancellationToken>,
}

impl PollScheduler {
    pub fn new(sync: Synchronizer, rate: Hertz) -> Self {
        Self {
            sync,
            rate: Hertz::clamped(rate.0),
            cancel: None,
        }
    }

    pub fn rate(&self) -> Hertz {
        self.rate
    }

    pub fn status(&self) -> SchedulerStatus {
        if self.cancel.is_some() {
            SchedulerStatus::Running
        } else {
            SchedulerStatus::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn info(&self) -> SchedulerInfo {
        SchedulerInfo {
            status: self.status(),
            rate_hz: self.rate,
        }
    }

    /// Start polling at `rate`, replacing any running schedule
    ///
    /// Does nothing and reports `NotProvisioned` until a simulation exists.
    pub async fn start(&mut self, rate: Hertz) -> Result<SchedulerInfo, SyncError> {
        if !self.sync.is_provisioned().await {
            warn!("Ignoring start request: no simulation provisioned");
            return Err(SyncError::NotProvisioned);
        }

        self.rate = Hertz::clamped(rate.0);
        self.spawn();
        info!("Polling started at {} Hz", self.rate.0);
        self.publish();
        Ok(self.info())
    }

    /// Stop polling; returns whether a schedule was running
    ///
    /// A request already on the wire is abandoned, not applied.
    pub fn stop(&mut self) -> bool {
        match self.cancel.take() {
            Some(token) => {
                token.cancel();
                info!("Polling stopped");
                self.publish();
                true
            }
            None => false,
        }
    }

    /// Change the polling rate, rescheduling immediately when running
    pub fn set_rate(&mut self, rate: Hertz) -> SchedulerInfo {
        let rate = Hertz::clamped(rate.0);
        if rate == self.rate {
            return self.info();
        }

        self.rate = rate;
        if self.is_running() {
            self.spawn();
            info!("Polling rate changed to {} Hz", rate.0);
        } else {
            debug!("Polling rate set to {} Hz while idle", rate.0);
        }
        self.publish();
        self.info()
    }

    fn spawn(&mut self) {
        if let Some(previous) = self.cancel.take() {
            previous.cancel();
        }

        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        tokio::spawn(poll_loop(self.sync.clone(), self.rate, token));
    }

    fn publish(&self) {
        self.sync.publish(ViewUpdate::Scheduler(self.info()));
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

async fn poll_loop(sync: Synchronizer, rate: Hertz, cancel: CancellationToken) {
    let period = rate.interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!("Poll task started ({:?} period)", period);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = sync.refresh(rate) => match result {
                Ok(_) => {}
                Err(e @ SyncError::StaleResponse { .. }) => debug!("Discarded response: {}", e),
                Err(e) => warn!("Dropped tick: {}", e),
            },
        }
    }

    debug!("Poll task ended");
}
