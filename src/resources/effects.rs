//! Named status effects with turn durations
//!
//! Effects are matched by name case-insensitively and keep insertion order.

use serde::{Deserialize, Serialize};

/// A status effect instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Effect name as first entered
    pub name: String,
    /// Turns left before the effect expires
    pub remaining: i64,
}

impl StatusEffect {
    /// Create a new status effect
    pub fn new(name: &str, remaining: i64) -> Self {
        Self {
            name: name.to_string(),
            remaining,
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    /// Check if effect has expired
    pub fn is_expired(&self) -> bool {
        self.remaining <= 0
    }
}

/// Outcome of advancing a player's turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    pub expired: Vec<StatusEffect>,
    pub remaining: Vec<StatusEffect>,
}

/// Ordered status effects on one player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusEffects {
    effects: Vec<StatusEffect>,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the duration of a matching effect, or append a new one.
    /// Returns true if an existing effect was updated.
    pub fn add_or_update(&mut self, name: &str, duration: i64) -> bool {
        if let Some(existing) = self.effects.iter_mut().find(|e| e.matches(name)) {
            existing.remaining = duration;
            true
        } else {
            self.effects.push(StatusEffect::new(name.trim(), duration));
            false
        }
    }

    /// Remove a matching effect, returning it if present
    pub fn remove(&mut self, name: &str) -> Option<StatusEffect> {
        let pos = self.effects.iter().position(|e| e.matches(name))?;
        Some(self.effects.remove(pos))
    }

    /// Get an effect if present
    pub fn get(&self, name: &str) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.matches(name))
    }

    /// Tick every effect down by one turn and drop the expired ones
    pub fn advance(&mut self) -> TurnReport {
        for effect in &mut self.effects {
            effect.remaining = effect.remaining.saturating_sub(1);
        }

        let (expired, remaining): (Vec<_>, Vec<_>) =
            self.effects.drain(..).partition(StatusEffect::is_expired);
        self.effects = remaining.clone();

        TurnReport { expired, remaining }
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
