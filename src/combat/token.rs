//! Pending-choice correlation tokens
//!
//! A paused attack hands the dispatcher an opaque token naming the open
//! prompt. The roll itself (dice and modifier) stays in the penalty ledger
//! until the prompt is answered, so a token can be redeemed once at most.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::dice::DieSize;
use super::penalty::ActionKind;
use crate::error::TrackerError;

/// Context of a roll waiting on a penalty choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRoll {
    pub player_id: String,
    pub kind: ActionKind,
    pub die1: DieSize,
    pub die2: DieSize,
    pub modifier: i64,
}

/// Reference to one open prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceToken {
    pub player_id: String,
    pub kind: ActionKind,
    pub nonce: u64,
}

impl ChoiceToken {
    /// Encode as a URL-safe opaque string
    pub fn encode(&self) -> String {
        // Serializing plain owned fields cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a token produced by [`ChoiceToken::encode`]
    pub fn decode(token: &str) -> Result<Self, TrackerError> {
        let malformed = || TrackerError::InvalidInput("malformed pending-choice token".to_string());
        let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|_| malformed())?;
        serde_json::from_slice(&bytes).map_err(|_| malformed())
    }
}
