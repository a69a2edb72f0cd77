//! Two-die roll resolution
//!
//! Every roll throws two dice (possibly of different sizes) and compares
//! both against a gate:
//! - (1, 1) is a fumble, whatever the gate
//! - equal faces above 5 are a critical
//! - otherwise both dice must beat the gate (strictly) to hit

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Largest die a roll may use
pub const MAX_DIE_SIZE: u32 = 100;

/// Faces both dice must exceed (and match on) for a critical
pub const CRITICAL_FLOOR: u32 = 5;

/// Number of sides on a die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DieSize(u32);

impl DieSize {
    pub fn new(sides: u32) -> Result<Self, TrackerError> {
        if sides == 0 || sides > MAX_DIE_SIZE {
            return Err(TrackerError::InvalidInput(format!(
                "die size must be between 1 and {}, got {}",
                MAX_DIE_SIZE, sides
            )));
        }
        Ok(Self(sides))
    }

    pub fn sides(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for DieSize {
    type Error = TrackerError;

    fn try_from(sides: u32) -> Result<Self, Self::Error> {
        DieSize::new(sides)
    }
}

impl From<DieSize> for u32 {
    fn from(size: DieSize) -> u32 {
        size.0
    }
}

impl FromStr for DieSize {
    type Err = TrackerError;

    /// Accepts "d8", "D8" or "8"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let digits = s.strip_prefix('d').unwrap_or(&s);
        let sides: u32 = digits
            .parse()
            .map_err(|_| TrackerError::InvalidInput(format!("invalid die: {}", s)))?;
        DieSize::new(sides)
    }
}

impl fmt::Display for DieSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// How a roll landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Fumble,
    Critical,
    Hit,
    Miss,
}

impl Classification {
    /// Whether the roll succeeds
    pub fn is_success(&self) -> bool {
        matches!(self, Classification::Critical | Classification::Hit)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::Fumble => "fumble",
            Classification::Critical => "critical",
            Classification::Hit => "hit",
            Classification::Miss => "miss",
        };
        write!(f, "{}", s)
    }
}

/// Classify a pair of die results against a gate
pub fn classify(roll1: u32, roll2: u32, gate: u32) -> Classification {
    if roll1 == 1 && roll2 == 1 {
        Classification::Fumble
    } else if roll1 == roll2 && roll1 > CRITICAL_FLOOR {
        Classification::Critical
    } else if roll1 > gate && roll2 > gate {
        Classification::Hit
    } else {
        Classification::Miss
    }
}

/// Structured result of one roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollOutcome {
    pub roll1: u32,
    pub roll2: u32,
    pub total: u32,
    pub high_roll: u32,
    pub gate: u32,
    /// High roll plus modifier; absent for checks
    pub damage: Option<i64>,
    pub classification: Classification,
}

/// Resolve an attack or cast from already-thrown dice
pub fn resolve(roll1: u32, roll2: u32, modifier: i64, gate: u32) -> RollOutcome {
    let mut outcome = resolve_check(roll1, roll2, gate);
    outcome.damage = Some((outcome.high_roll as i64).saturating_add(modifier));
    outcome
}

/// Resolve a skill check: same classification, no damage
pub fn resolve_check(roll1: u32, roll2: u32, gate: u32) -> RollOutcome {
    RollOutcome {
        roll1,
        roll2,
        total: roll1 + roll2,
        high_roll: roll1.max(roll2),
        gate,
        damage: None,
        classification: classify(roll1, roll2, gate),
    }
}

/// Source of die results
pub trait DiceSource: Send + Sync {
    /// Throw one die, returning a face in `[1, sides]`
    fn roll(&self, sides: DieSize) -> u32;

    /// Throw two dice independently
    fn roll_pair(&self, die1: DieSize, die2: DieSize) -> (u32, u32) {
        (self.roll(die1), self.roll(die2))
    }
}

/// Uniform dice backed by the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDice;

impl DiceSource for RandomDice {
    fn roll(&self, sides: DieSize) -> u32 {
        rand::rng().random_range(1..=sides.sides())
    }
}

/// Dice that return queued faces in order, for tests and replays.
/// Falls back to 1 when the queue runs dry.
#[derive(Debug, Default)]
pub struct ScriptedDice {
    faces: Mutex<VecDeque<u32>>,
}

impl ScriptedDice {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: Mutex::new(faces.into_iter().collect()),
        }
    }

    /// Queue more faces
    pub fn push(&self, faces: impl IntoIterator<Item = u32>) {
        self.faces.lock().extend(faces);
    }
}

impl DiceSource for ScriptedDice {
    fn roll(&self, sides: DieSize) -> u32 {
        self.faces
            .lock()
            .pop_front()
            .unwrap_or(1)
            .clamp(1, sides.sides())
    }
}
