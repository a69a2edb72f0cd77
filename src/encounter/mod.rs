//! Encounter (clash) roster
//!
//! A single GM-scoped encounter groups a subset of players as combatants.
//!
//! ```text
//! ┌──────────┐   start    ┌────────┐
//! │ Inactive │───────────▶│ Active │──┐ add / remove combatants
//! └──────────┘◀───────────└────────┘◀─┘
//!                 end
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};
use crate::resources::{PlayerRecord, ResourceStore, StatusEffect};

/// Persisted encounter state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterState {
    pub active: bool,
    /// Combatant ids in insertion order, no duplicates
    #[serde(default)]
    pub combatants: Vec<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// Why a combatant id was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No character sheet exists for this id
    UnknownPlayer,
    /// Already on the roster
    AlreadyPresent,
    /// Not on the roster
    NotPresent,
}

/// Per-id outcome of a roster change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterChange {
    pub applied: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
}

/// Live view of one combatant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombatantSnapshot {
    pub id: String,
    pub name: String,
    pub hp: (i64, i64),
    pub mp: (i64, i64),
    pub ip: (i64, i64),
    pub armor: (i64, i64),
    pub barrier: (i64, i64),
    pub statuses: Vec<StatusEffect>,
}

impl From<&PlayerRecord> for CombatantSnapshot {
    fn from(record: &PlayerRecord) -> Self {
        let pair = |p: &crate::resources::ResourcePair| (p.current, p.max);
        Self {
            id: record.id.clone(),
            name: record.label().to_string(),
            hp: pair(&record.hp),
            mp: pair(&record.mp),
            ip: pair(&record.ip),
            armor: pair(&record.armor),
            barrier: pair(&record.barrier),
            statuses: record.statuses.iter().cloned().collect(),
        }
    }
}

/// Result of listing the roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RosterView {
    NoActiveEncounter,
    NoCombatants,
    Combatants { combatants: Vec<CombatantSnapshot> },
}

impl EncounterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new encounter with an empty roster
    pub fn start(&mut self) -> TrackerResult<()> {
        if self.active {
            return Err(TrackerError::InvalidState(
                "an encounter is already active".to_string(),
            ));
        }
        self.active = true;
        self.combatants.clear();
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// End the encounter and clear the roster
    pub fn end(&mut self) -> TrackerResult<()> {
        self.require_active()?;
        self.active = false;
        self.combatants.clear();
        self.started_at = None;
        Ok(())
    }

    fn require_active(&self) -> TrackerResult<()> {
        if self.active {
            Ok(())
        } else {
            Err(TrackerError::InvalidState(
                "no encounter is active".to_string(),
            ))
        }
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.combatants.iter().any(|c| c == player_id)
    }

    /// Append combatants that have sheets and are not yet present
    pub fn add_combatants<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        store: &ResourceStore,
    ) -> TrackerResult<RosterChange> {
        self.require_active()?;
        let mut change = RosterChange::default();
        for id in ids.iter().map(AsRef::as_ref) {
            if !store.contains(id) {
                change.skipped.push((id.to_string(), SkipReason::UnknownPlayer));
            } else if self.contains(id) {
                change.skipped.push((id.to_string(), SkipReason::AlreadyPresent));
            } else {
                self.combatants.push(id.to_string());
                change.applied.push(id.to_string());
            }
        }
        Ok(change)
    }

    /// Remove combatants, reporting ids that were not on the roster
    pub fn remove_combatants<S: AsRef<str>>(&mut self, ids: &[S]) -> TrackerResult<RosterChange> {
        self.require_active()?;
        let mut change = RosterChange::default();
        for id in ids.iter().map(AsRef::as_ref) {
            if self.forget(id) {
                change.applied.push(id.to_string());
            } else {
                change.skipped.push((id.to_string(), SkipReason::NotPresent));
            }
        }
        Ok(change)
    }

    /// Drop a player from the roster regardless of state
    pub fn forget(&mut self, player_id: &str) -> bool {
        let before = self.combatants.len();
        self.combatants.retain(|c| c != player_id);
        self.combatants.len() != before
    }

    /// Ordered combatants with their current sheets
    pub fn list(&self, store: &ResourceStore) -> RosterView {
        if !self.active {
            return RosterView::NoActiveEncounter;
        }
        let combatants: Vec<CombatantSnapshot> = self
            .combatants
            .iter()
            .filter_map(|id| store.get(id))
            .map(CombatantSnapshot::from)
            .collect();
        if combatants.is_empty() {
            RosterView::NoCombatants
        } else {
            RosterView::Combatants { combatants }
        }
    }
}
