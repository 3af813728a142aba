//! Error types for tfwait

use std::time::Duration;

/// Error returned by a status query that failed for a reason other than the
/// resource not existing
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Terminal failure of a state-change wait
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("{id} not found while waiting for state change")]
    NotFound { id: String },

    #[error("unexpected state '{status}' for {id}, wanted target {target:?} (pending {pending:?})")]
    UnexpectedState {
        id: String,
        status: String,
        pending: Vec<String>,
        target: Vec<String>,
    },

    #[error("timeout while waiting for {id} to reach target state (last state: '{last_status}', elapsed: {elapsed:?})")]
    Timeout {
        id: String,
        last_status: String,
        elapsed: Duration,
    },

    #[error("failed to query status of {id}: {source}")]
    QueryFailed {
        id: String,
        #[source]
        source: BoxError,
    },

    #[error("invalid wait request: {0}")]
    InvalidRequest(String),
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WaitError::NotFound { .. })
    }

    pub fn is_unexpected_state(&self) -> bool {
        matches!(self, WaitError::UnexpectedState { .. })
    }

    /// Identifier of the resource the wait was about, if any
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            WaitError::NotFound { id }
            | WaitError::UnexpectedState { id, .. }
            | WaitError::Timeout { id, .. }
            | WaitError::QueryFailed { id, .. } => Some(id),
            WaitError::InvalidRequest(_) => None,
        }
    }
}
