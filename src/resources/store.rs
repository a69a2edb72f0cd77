//! In-memory resource store keyed by player id

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Maxima, PlayerRecord, ResourceKind, TurnReport};
use crate::error::{TrackerError, TrackerResult};

/// Before/after values of one resource change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceChange {
    pub kind: ResourceKind,
    pub before: i64,
    pub after: i64,
    pub max: i64,
}

/// Player sheets by id. Ordered so saved documents are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceStore {
    players: BTreeMap<String, PlayerRecord>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from loaded records
    pub fn from_players(players: BTreeMap<String, PlayerRecord>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &BTreeMap<String, PlayerRecord> {
        &self.players
    }

    pub fn get(&self, player_id: &str) -> Option<&PlayerRecord> {
        self.players.get(player_id)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.contains_key(player_id)
    }

    /// Get a player's sheet, creating a zeroed one on first reference.
    /// A known display name refreshes the stored one.
    pub fn get_or_create(&mut self, player_id: &str, display_name: Option<&str>) -> &mut PlayerRecord {
        let record = self
            .players
            .entry(player_id.to_string())
            .or_insert_with(|| PlayerRecord::new(player_id, display_name.unwrap_or(player_id)));
        if let Some(name) = display_name {
            if record.display_name != name {
                record.display_name = name.to_string();
            }
        }
        record
    }

    /// Set all maxima and refill HP/MP/Armor/Barrier. Current IP is kept.
    pub fn upsert_max(
        &mut self,
        player_id: &str,
        display_name: Option<&str>,
        character_name: &str,
        maxima: Maxima,
    ) -> &PlayerRecord {
        let record = self.get_or_create(player_id, display_name);
        record.character_name = character_name.trim().to_string();
        for kind in ResourceKind::ALL {
            let pair = record.resource_mut(kind);
            pair.max = maxima.get(kind);
            if kind != ResourceKind::Ip {
                pair.current = pair.max;
            }
        }
        record
    }

    /// Add a signed delta to the current value of one resource.
    /// With `clamp` off, the result may leave `[0, max]`.
    pub fn adjust(
        &mut self,
        player_id: &str,
        display_name: Option<&str>,
        kind: ResourceKind,
        delta: i64,
        clamp: bool,
    ) -> ResourceChange {
        let pair = self.get_or_create(player_id, display_name).resource_mut(kind);
        let before = pair.current;
        let mut after = before.saturating_add(delta);
        if clamp {
            after = after.clamp(0, pair.max.max(0));
        }
        pair.current = after;
        ResourceChange {
            kind,
            before,
            after,
            max: pair.max,
        }
    }

    pub fn set_to_max(
        &mut self,
        kind: ResourceKind,
        player_id: &str,
        display_name: Option<&str>,
    ) -> ResourceChange {
        let pair = self.get_or_create(player_id, display_name).resource_mut(kind);
        let before = pair.current;
        pair.current = pair.max;
        ResourceChange {
            kind,
            before,
            after: pair.current,
            max: pair.max,
        }
    }

    pub fn set_to_zero(
        &mut self,
        kind: ResourceKind,
        player_id: &str,
        display_name: Option<&str>,
    ) -> ResourceChange {
        let pair = self.get_or_create(player_id, display_name).resource_mut(kind);
        let before = pair.current;
        pair.current = 0;
        ResourceChange {
            kind,
            before,
            after: 0,
            max: pair.max,
        }
    }

    /// Refill every resource a rest restores; IP is untouched
    pub fn rest(&mut self, player_id: &str, display_name: Option<&str>) -> Vec<ResourceChange> {
        let record = self.get_or_create(player_id, display_name);
        Self::rest_record(record)
    }

    /// Rest every stored player, returning how many sheets were touched
    pub fn rest_all(&mut self) -> usize {
        for record in self.players.values_mut() {
            Self::rest_record(record);
        }
        self.players.len()
    }

    fn rest_record(record: &mut PlayerRecord) -> Vec<ResourceChange> {
        ResourceKind::ALL
            .into_iter()
            .filter(ResourceKind::restored_by_rest)
            .map(|kind| {
                let pair = record.resource_mut(kind);
                let before = pair.current;
                pair.current = pair.max;
                ResourceChange {
                    kind,
                    before,
                    after: pair.current,
                    max: pair.max,
                }
            })
            .collect()
    }

    /// Add a status or overwrite its duration. Returns true if it already existed.
    pub fn add_or_update_status(
        &mut self,
        player_id: &str,
        display_name: Option<&str>,
        name: &str,
        duration: i64,
    ) -> TrackerResult<bool> {
        if name.trim().is_empty() {
            return Err(TrackerError::InvalidInput(
                "status effect name must not be empty".to_string(),
            ));
        }
        Ok(self
            .get_or_create(player_id, display_name)
            .statuses
            .add_or_update(name, duration))
    }

    pub fn remove_status(&mut self, player_id: &str, name: &str) -> TrackerResult<()> {
        let record = self
            .players
            .get_mut(player_id)
            .ok_or_else(|| TrackerError::player_not_found(player_id))?;
        record
            .statuses
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| TrackerError::NotFound(format!("status effect {} not found", name.trim())))
    }

    /// Tick all of a player's statuses down by one turn
    pub fn advance_turn(&mut self, player_id: &str, display_name: Option<&str>) -> TurnReport {
        self.get_or_create(player_id, display_name).statuses.advance()
    }

    pub fn delete(&mut self, player_id: &str) -> TrackerResult<PlayerRecord> {
        self.players
            .remove(player_id)
            .ok_or_else(|| TrackerError::player_not_found(player_id))
    }
}
