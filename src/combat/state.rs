//! Attack, cast and check flows
//!
//! Ties the penalty ledger to the dice:
//! - Attack: a repeat attempt without a chosen penalty pauses for a choice
//! - Cast: penalties only when the caster picks one
//! - Check: fixed gate, no penalties, no damage

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::dice::{resolve, resolve_check, DiceSource, DieSize, RandomDice, RollOutcome};
use super::penalty::{ActionKind, PenaltyChoice, PenaltyLedger, PenaltyState};
use super::token::{ChoiceToken, PendingRoll};
use crate::error::{TrackerError, TrackerResult};

/// Request to roll an attack or a cast
#[derive(Debug, Clone)]
pub struct RollRequest {
    pub die1: DieSize,
    pub die2: DieSize,
    pub modifier: i64,
    pub choice: Option<PenaltyChoice>,
}

/// A finished attack or cast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoll {
    pub player_id: String,
    pub kind: ActionKind,
    /// Attempt number within the round
    pub attempt: u32,
    pub penalties: PenaltyState,
    pub raw_modifier: i64,
    pub effective_modifier: i64,
    pub outcome: RollOutcome,
}

/// An attack paused until the player picks a penalty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingChoice {
    pub player_id: String,
    pub attempt: u32,
    pub choices: Vec<PenaltyChoice>,
    /// Opaque token to hand back with the choice
    pub token: String,
}

/// Result of starting an attack or cast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RollFlow {
    Resolved(ResolvedRoll),
    PendingChoice(PendingChoice),
}

/// Combat manager for the table
pub struct CombatManager {
    ledger: PenaltyLedger,
    dice: Arc<dyn DiceSource>,
}

impl Default for CombatManager {
    fn default() -> Self {
        Self::new(Arc::new(RandomDice))
    }
}

impl CombatManager {
    /// Create a combat manager rolling with the given dice
    pub fn new(dice: Arc<dyn DiceSource>) -> Self {
        Self {
            ledger: PenaltyLedger::new(),
            dice,
        }
    }

    pub fn ledger(&self) -> &PenaltyLedger {
        &self.ledger
    }

    /// Start an attack. The second and later attempts in a round pause for a
    /// penalty unless one was chosen up front.
    pub fn attack(&self, player_id: &str, req: RollRequest) -> RollFlow {
        self.start(player_id, ActionKind::Attack, req)
    }

    /// Roll a cast. Penalties apply only when chosen, never by prompt.
    pub fn cast(&self, player_id: &str, req: RollRequest) -> ResolvedRoll {
        let penalties = self.ledger.record_attempt(player_id, ActionKind::Cast, req.choice);
        self.roll(player_id, ActionKind::Cast, req.die1, req.die2, req.modifier, penalties)
    }

    fn start(&self, player_id: &str, kind: ActionKind, req: RollRequest) -> RollFlow {
        let penalties = self.ledger.record_attempt(player_id, kind, req.choice);

        if kind.forces_choice() && req.choice.is_none() && penalties.attempts >= 2 {
            let token = self.ledger.open_prompt(PendingRoll {
                player_id: player_id.to_string(),
                kind,
                die1: req.die1,
                die2: req.die2,
                modifier: req.modifier,
            });
            debug!(
                "{} attempt {} by {} waits for a penalty choice",
                kind, penalties.attempts, player_id
            );
            return RollFlow::PendingChoice(PendingChoice {
                player_id: player_id.to_string(),
                attempt: penalties.attempts,
                choices: penalties.available_choices(),
                token: token.encode(),
            });
        }

        RollFlow::Resolved(self.roll(player_id, kind, req.die1, req.die2, req.modifier, penalties))
    }

    /// Finish a paused attack with the acting player's choice.
    ///
    /// The prompt is consumed, so each token resolves at most one roll.
    pub fn resume(&self, actor_id: &str, token: &str, choice: PenaltyChoice) -> TrackerResult<ResolvedRoll> {
        let token = ChoiceToken::decode(token)?;
        if token.player_id != actor_id {
            return Err(TrackerError::Unauthorized(
                "only the player who rolled may choose this penalty".to_string(),
            ));
        }
        if token.kind != ActionKind::Attack {
            return Err(TrackerError::InvalidInput(
                "token does not refer to a paused attack".to_string(),
            ));
        }

        let (pending, penalties) = self.ledger.take_prompt(&token, choice)?;
        Ok(self.roll(
            actor_id,
            pending.kind,
            pending.die1,
            pending.die2,
            pending.modifier,
            penalties,
        ))
    }

    /// Skill check against a fixed gate
    pub fn check(&self, die1: DieSize, die2: DieSize, gate: u32) -> RollOutcome {
        let (roll1, roll2) = self.dice.roll_pair(die1, die2);
        resolve_check(roll1, roll2, gate)
    }

    fn roll(
        &self,
        player_id: &str,
        kind: ActionKind,
        die1: DieSize,
        die2: DieSize,
        raw_modifier: i64,
        penalties: PenaltyState,
    ) -> ResolvedRoll {
        let gate = penalties.effective_gate();
        let effective_modifier = penalties.effective_modifier(raw_modifier);
        let (roll1, roll2) = self.dice.roll_pair(die1, die2);
        let outcome = resolve(roll1, roll2, effective_modifier, gate);

        debug!(
            "{} {} {}+{}: ({}, {}) gate {} -> {}",
            player_id, kind, die1, die2, roll1, roll2, gate, outcome.classification
        );

        ResolvedRoll {
            player_id: player_id.to_string(),
            kind,
            attempt: penalties.attempts,
            penalties,
            raw_modifier,
            effective_modifier,
            outcome,
        }
    }

    /// New round: clear every penalty
    pub fn next_round(&self) -> usize {
        self.ledger.reset_all()
    }

    /// Clear penalties for one player, one kind or both
    pub fn reset_penalties(&self, player_id: &str, kind: Option<ActionKind>) -> bool {
        match kind {
            Some(kind) => self.ledger.reset_one(player_id, kind),
            None => {
                let attack = self.ledger.reset_one(player_id, ActionKind::Attack);
                let cast = self.ledger.reset_one(player_id, ActionKind::Cast);
                attack || cast
            }
        }
    }
}
