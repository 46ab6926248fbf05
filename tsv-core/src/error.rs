//! Synchronization errors

use thiserror::Error;

/// Errors that can occur while provisioning or polling a simulation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("No simulation has been provisioned")]
    NotProvisioned,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Simulation service returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Response belongs to generation {actual}, session is at {expected}")]
    StaleResponse { expected: u64, actual: u64 },
}

impl SyncError {
    /// Whether the error came from the remote service rather than local state
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(_) | SyncError::Status { .. } | SyncError::MalformedPayload(_)
        )
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::MalformedPayload(err.to_string())
    }
}
