//! Combat rolls
//!
//! Implements the clash roll rules:
//! - Two-die rolls against a gate (hit/miss/critical/fumble)
//! - Round-scoped penalty accrual for attacks and casts
//! - Deferred penalty choice through opaque tokens

mod dice;
mod penalty;
mod state;
mod token;

pub use dice::{
    classify, resolve, resolve_check, Classification, DiceSource, DieSize, RandomDice,
    RollOutcome, ScriptedDice,
};
pub use penalty::{ActionKind, PenaltyChoice, PenaltyLedger, PenaltyState, BASE_GATE, BLIND_GATE};
pub use state::{CombatManager, PendingChoice, ResolvedRoll, RollFlow, RollRequest};
pub use token::{ChoiceToken, PendingRoll};
