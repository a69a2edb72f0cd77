//! Round-scoped penalty ledger
//!
//! Tracks, per player and per action kind, how many attempts were made this
//! round, which penalties have stacked up, and which attacks are paused on a
//! penalty choice. Nothing here is persisted; a new round (or a GM reset)
//! wipes it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::token::{ChoiceToken, PendingRoll};
use crate::error::{TrackerError, TrackerResult};

/// Base gate before any penalty
pub const BASE_GATE: u32 = 1;

/// Gate forced by the blind penalty
pub const BLIND_GATE: u32 = 3;

/// Action kinds that accrue penalties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Attack,
    Cast,
}

impl ActionKind {
    /// Whether a repeated attempt must stop and ask for a penalty
    pub fn forces_choice(&self) -> bool {
        matches!(self, ActionKind::Attack)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Attack => write!(f, "attack"),
            ActionKind::Cast => write!(f, "cast"),
        }
    }
}

impl FromStr for ActionKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "attack" => Ok(ActionKind::Attack),
            "cast" => Ok(ActionKind::Cast),
            other => Err(TrackerError::InvalidInput(format!(
                "unknown action kind: {}",
                other
            ))),
        }
    }
}

/// A penalty the acting player may pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyChoice {
    /// Raise the gate by one
    Gate,
    /// Halve the modifier (stacks)
    Damage50,
    /// Drop the modifier entirely
    Damage100,
    /// Fix the gate at 3, once per round
    Blind,
}

impl PenaltyChoice {
    pub const ALL: [PenaltyChoice; 4] = [
        PenaltyChoice::Gate,
        PenaltyChoice::Damage50,
        PenaltyChoice::Damage100,
        PenaltyChoice::Blind,
    ];
}

impl FromStr for PenaltyChoice {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gate" => Ok(PenaltyChoice::Gate),
            "damage50" | "damage_50" | "half" => Ok(PenaltyChoice::Damage50),
            "damage100" | "damage_100" | "none" => Ok(PenaltyChoice::Damage100),
            "blind" => Ok(PenaltyChoice::Blind),
            other => Err(TrackerError::InvalidInput(format!(
                "unknown penalty: {}",
                other
            ))),
        }
    }
}

/// Accrued penalties for one player and action kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PenaltyState {
    pub attempts: u32,
    pub gate_bonus: u32,
    pub damage_reduction_percent: u32,
    pub blind: bool,
}

impl PenaltyState {
    /// Stack one penalty onto this state
    pub fn apply(&mut self, choice: PenaltyChoice) {
        match choice {
            PenaltyChoice::Gate => self.gate_bonus = self.gate_bonus.saturating_add(1),
            PenaltyChoice::Damage50 => {
                self.damage_reduction_percent = self.damage_reduction_percent.saturating_add(50)
            }
            PenaltyChoice::Damage100 => {
                self.damage_reduction_percent = self.damage_reduction_percent.saturating_add(100)
            }
            PenaltyChoice::Blind => self.blind = true,
        }
    }

    /// Gate the dice must beat
    pub fn effective_gate(&self) -> u32 {
        if self.blind {
            BLIND_GATE
        } else {
            BASE_GATE.saturating_add(self.gate_bonus)
        }
    }

    /// Raw modifier scaled by the remaining damage fraction, floored
    pub fn effective_modifier(&self, raw: i64) -> i64 {
        let remaining = 100i128
            .saturating_sub(self.damage_reduction_percent as i128)
            .max(0);
        // |result| <= |raw| since remaining <= 100
        (raw as i128 * remaining).div_euclid(100) as i64
    }

    /// Penalties that may still be offered
    pub fn available_choices(&self) -> Vec<PenaltyChoice> {
        PenaltyChoice::ALL
            .into_iter()
            .filter(|c| !(self.blind && *c == PenaltyChoice::Blind))
            .collect()
    }

    pub fn is_offered(&self, choice: PenaltyChoice) -> bool {
        self.available_choices().contains(&choice)
    }
}

type LedgerKey = (String, ActionKind);

/// An attack paused on a penalty choice
#[derive(Debug)]
struct OpenPrompt {
    nonce: u64,
    roll: PendingRoll,
}

#[derive(Debug, Default)]
struct LedgerInner {
    states: HashMap<LedgerKey, PenaltyState>,
    prompts: HashMap<LedgerKey, OpenPrompt>,
}

/// Penalty states and open prompts for every player, both action kinds
#[derive(Debug, Default)]
pub struct PenaltyLedger {
    inner: Mutex<LedgerInner>,
}

impl PenaltyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more attempt, stacking `choice` in the same step.
    /// Returns the state after the update.
    pub fn record_attempt(
        &self,
        player_id: &str,
        kind: ActionKind,
        choice: Option<PenaltyChoice>,
    ) -> PenaltyState {
        let mut inner = self.inner.lock();
        let state = inner.states.entry((player_id.to_string(), kind)).or_default();
        state.attempts = state.attempts.saturating_add(1);
        if let Some(choice) = choice {
            state.apply(choice);
        }
        *state
    }

    /// Park a roll until its player picks a penalty. Replaces any prompt
    /// already open for the same player and kind.
    pub fn open_prompt(&self, roll: PendingRoll) -> ChoiceToken {
        let token = ChoiceToken {
            player_id: roll.player_id.clone(),
            kind: roll.kind,
            nonce: rand::random(),
        };
        self.inner.lock().prompts.insert(
            (roll.player_id.clone(), roll.kind),
            OpenPrompt {
                nonce: token.nonce,
                roll,
            },
        );
        token
    }

    #[cfg(test)]
    fn has_open_prompt(&self, player_id: &str, kind: ActionKind) -> bool {
        self.inner
            .lock()
            .prompts
            .contains_key(&(player_id.to_string(), kind))
    }

    /// Answer an open prompt: consume it and stack `choice` without counting
    /// another attempt. A choice that is not offered leaves the prompt open.
    pub fn take_prompt(
        &self,
        token: &ChoiceToken,
        choice: PenaltyChoice,
    ) -> TrackerResult<(PendingRoll, PenaltyState)> {
        let key = (token.player_id.clone(), token.kind);
        let closed = || TrackerError::InvalidState("this penalty prompt is no longer open".to_string());
        let mut inner = self.inner.lock();

        match inner.prompts.get(&key) {
            Some(open) if open.nonce == token.nonce => {}
            _ => return Err(closed()),
        }

        let state = inner.states.entry(key.clone()).or_default();
        if !state.is_offered(choice) {
            return Err(TrackerError::InvalidInput(format!(
                "{:?} was already applied this round",
                choice
            )));
        }
        state.apply(choice);
        let state = *state;

        let open = inner.prompts.remove(&key).ok_or_else(closed)?;
        Ok((open.roll, state))
    }

    /// Current state, empty if nothing was recorded this round
    pub fn snapshot(&self, player_id: &str, kind: ActionKind) -> PenaltyState {
        self.inner
            .lock()
            .states
            .get(&(player_id.to_string(), kind))
            .copied()
            .unwrap_or_default()
    }

    /// Start a new round: forget every counter, penalty and open prompt.
    /// Returns how many penalty entries were cleared.
    pub fn reset_all(&self) -> usize {
        let mut inner = self.inner.lock();
        let cleared = inner.states.len();
        inner.states.clear();
        inner.prompts.clear();
        cleared
    }

    /// Clear one player's state and open prompt for one action kind
    pub fn reset_one(&self, player_id: &str, kind: ActionKind) -> bool {
        let key = (player_id.to_string(), kind);
        let mut inner = self.inner.lock();
        let state = inner.states.remove(&key).is_some();
        let prompt = inner.prompts.remove(&key).is_some();
        state || prompt
    }
}
