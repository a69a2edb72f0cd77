//! Tracker error kinds
//!
//! Every variant is recoverable at the dispatcher boundary. The reason string
//! is meant to be shown to the requester as-is.

use thiserror::Error;

/// Errors raised by tracker operations
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Player, status effect, or combatant does not exist
    #[error("{0}")]
    NotFound(String),

    /// Operation not valid in the current encounter state
    #[error("{0}")]
    InvalidState(String),

    /// Malformed request value
    #[error("{0}")]
    InvalidInput(String),

    /// Requester may not perform this operation
    #[error("{0}")]
    Unauthorized(String),

    /// Backend failure while loading or saving state
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl TrackerError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerError::NotFound(_) => "not_found",
            TrackerError::InvalidState(_) => "invalid_state",
            TrackerError::InvalidInput(_) => "invalid_input",
            TrackerError::Unauthorized(_) => "unauthorized",
            TrackerError::Storage(_) => "storage",
        }
    }

    pub(crate) fn player_not_found(player_id: &str) -> Self {
        TrackerError::NotFound(format!("no character sheet for player {}", player_id))
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
