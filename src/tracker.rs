//! Table tracker - the single owner of sheets, encounter and penalties
//!
//! Every request goes through a [`Tracker`]:
//! - Sheet and encounter mutations run under one write lock, then queue a flush
//! - Rolls go through the combat manager; penalties are never persisted
//! - GM-only operations check the requester before touching state

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::combat::{
    ActionKind, CombatManager, DiceSource, DieSize, PenaltyChoice, PenaltyState, ResolvedRoll,
    RollFlow, RollOutcome, RollRequest,
};
use crate::encounter::{EncounterState, RosterChange, RosterView};
use crate::error::{TrackerError, TrackerResult};
use crate::permissions::{GmAction, Requester};
use crate::persistence::{Backend, Flusher, Snapshot};
use crate::resources::{
    Amount, Maxima, PlayerRecord, ResourceChange, ResourceKind, ResourceStore, TurnReport,
};

/// Durable state guarded by the tracker lock
#[derive(Debug, Default)]
struct Table {
    store: ResourceStore,
    encounter: EncounterState,
}

impl Table {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            players: self.store.players().clone(),
            encounter: self.encounter.clone(),
        }
    }
}

/// Tracker behaviour switches
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerOptions {
    /// Clamp adjusted resources to `[0, max]`
    pub clamp_resources: bool,
}

pub struct Tracker {
    table: RwLock<Table>,
    combat: CombatManager,
    flusher: Flusher,
    options: TrackerOptions,
}

impl Tracker {
    /// Load state from a backend and start its writer
    pub async fn open(
        backend: Backend,
        dice: Arc<dyn DiceSource>,
        options: TrackerOptions,
    ) -> Result<Self> {
        let snapshot = backend.load_all().await?;
        info!(
            "Loaded {} players from {} backend (encounter {})",
            snapshot.players.len(),
            backend.name(),
            if snapshot.encounter.active { "active" } else { "inactive" }
        );

        Ok(Self {
            table: RwLock::new(Table {
                store: ResourceStore::from_players(snapshot.players),
                encounter: snapshot.encounter,
            }),
            combat: CombatManager::new(dice),
            flusher: Flusher::spawn(backend),
            options,
        })
    }

    /// Wait for queued flushes to reach the backend
    pub async fn sync(&self) {
        self.flusher.sync().await;
    }

    /// Run a mutation under the write lock and queue a flush if it succeeded
    async fn mutate<T>(&self, f: impl FnOnce(&mut Table) -> TrackerResult<T>) -> TrackerResult<T> {
        let mut table = self.table.write().await;
        let result = f(&mut *table)?;
        self.flusher.save(table.snapshot());
        Ok(result)
    }

    // ---- sheets ----

    pub async fn player(&self, player_id: &str) -> TrackerResult<PlayerRecord> {
        self.table
            .read()
            .await
            .store
            .get(player_id)
            .cloned()
            .ok_or_else(|| TrackerError::player_not_found(player_id))
    }

    pub async fn players(&self) -> Vec<PlayerRecord> {
        self.table.read().await.store.players().values().cloned().collect()
    }

    /// Set a character's maxima and refill the sheet
    pub async fn set_stats(
        &self,
        requester: &Requester,
        player_id: &str,
        character_name: &str,
        maxima: Maxima,
    ) -> TrackerResult<PlayerRecord> {
        requester.require_owner_or_gm(player_id)?;
        let name = requester.name_for(player_id);
        let record = self
            .mutate(|t| Ok(t.store.upsert_max(player_id, name, character_name, maxima).clone()))
            .await?;
        info!("{} set stats for {} ({})", requester.id, player_id, record.label());
        Ok(record)
    }

    /// Apply a delta, or set to full/zero
    pub async fn adjust(
        &self,
        requester: &Requester,
        player_id: &str,
        kind: ResourceKind,
        amount: Amount,
    ) -> TrackerResult<ResourceChange> {
        requester.require_owner_or_gm(player_id)?;
        let name = requester.name_for(player_id);
        let clamp = self.options.clamp_resources;
        let change = self
            .mutate(|t| {
                Ok(match amount {
                    Amount::Delta(delta) => t.store.adjust(player_id, name, kind, delta, clamp),
                    Amount::Full => t.store.set_to_max(kind, player_id, name),
                    Amount::Zero => t.store.set_to_zero(kind, player_id, name),
                })
            })
            .await?;
        debug!(
            "{} {}: {} -> {} (max {})",
            player_id, kind, change.before, change.after, change.max
        );
        Ok(change)
    }

    pub async fn rest(&self, requester: &Requester, player_id: &str) -> TrackerResult<Vec<ResourceChange>> {
        requester.require_owner_or_gm(player_id)?;
        let name = requester.name_for(player_id);
        self.mutate(|t| Ok(t.store.rest(player_id, name))).await
    }

    /// Rest every player at the table
    pub async fn rest_all(&self, requester: &Requester) -> TrackerResult<usize> {
        requester.require_gm(GmAction::RestAll)?;
        let count = self.mutate(|t| Ok(t.store.rest_all())).await?;
        info!("{} rested {} players", requester.id, count);
        Ok(count)
    }

    /// Returns true if an existing status was updated
    pub async fn set_status(
        &self,
        requester: &Requester,
        player_id: &str,
        name: &str,
        duration: i64,
    ) -> TrackerResult<bool> {
        requester.require_owner_or_gm(player_id)?;
        let display = requester.name_for(player_id);
        self.mutate(|t| t.store.add_or_update_status(player_id, display, name, duration))
            .await
    }

    pub async fn remove_status(&self, requester: &Requester, player_id: &str, name: &str) -> TrackerResult<()> {
        requester.require_owner_or_gm(player_id)?;
        self.mutate(|t| t.store.remove_status(player_id, name)).await
    }

    /// End a player's turn: tick their statuses down
    pub async fn advance_turn(&self, requester: &Requester, player_id: &str) -> TrackerResult<TurnReport> {
        requester.require_owner_or_gm(player_id)?;
        let name = requester.name_for(player_id);
        let report = self.mutate(|t| Ok(t.store.advance_turn(player_id, name))).await?;
        if !report.expired.is_empty() {
            debug!("{} statuses expired for {}", report.expired.len(), player_id);
        }
        Ok(report)
    }

    /// Remove a sheet, dropping the player from the encounter too
    pub async fn delete_player(&self, requester: &Requester, player_id: &str) -> TrackerResult<PlayerRecord> {
        requester.require_owner_or_gm(player_id)?;
        let mut table = self.table.write().await;
        let record = table.store.delete(player_id)?;
        table.encounter.forget(player_id);
        self.flusher.delete(player_id);
        self.flusher.save(table.snapshot());
        drop(table);

        self.combat.reset_penalties(player_id, None);
        info!("{} deleted sheet {}", requester.id, player_id);
        Ok(record)
    }

    // ---- encounter ----

    pub async fn start_encounter(&self, requester: &Requester) -> TrackerResult<()> {
        requester.require_gm(GmAction::StartEncounter)?;
        self.mutate(|t| t.encounter.start()).await?;
        info!("{} started an encounter", requester.id);
        Ok(())
    }

    pub async fn end_encounter(&self, requester: &Requester) -> TrackerResult<()> {
        requester.require_gm(GmAction::EndEncounter)?;
        self.mutate(|t| t.encounter.end()).await?;
        info!("{} ended the encounter", requester.id);
        Ok(())
    }

    pub async fn add_combatants(&self, ids: &[String]) -> TrackerResult<RosterChange> {
        self.mutate(|t| t.encounter.add_combatants(ids, &t.store)).await
    }

    pub async fn remove_combatants(&self, ids: &[String]) -> TrackerResult<RosterChange> {
        self.mutate(|t| t.encounter.remove_combatants(ids)).await
    }

    pub async fn encounter(&self) -> RosterView {
        let table = self.table.read().await;
        table.encounter.list(&table.store)
    }

    // ---- rolls ----

    /// Attack; may return a prompt instead of a result
    pub async fn attack(&self, requester: &Requester, req: RollRequest) -> RollFlow {
        self.combat.attack(&requester.id, req)
    }

    /// Finish a prompted attack. Only the player who rolled may answer.
    pub async fn resume_attack(
        &self,
        requester: &Requester,
        token: &str,
        choice: PenaltyChoice,
    ) -> TrackerResult<ResolvedRoll> {
        self.combat.resume(&requester.id, token, choice)
    }

    pub async fn cast(&self, requester: &Requester, req: RollRequest) -> ResolvedRoll {
        self.combat.cast(&requester.id, req)
    }

    pub async fn check(&self, die1: DieSize, die2: DieSize, gate: u32) -> RollOutcome {
        self.combat.check(die1, die2, gate)
    }

    pub fn penalties(&self, player_id: &str, kind: ActionKind) -> PenaltyState {
        self.combat.ledger().snapshot(player_id, kind)
    }

    /// Start a new round, clearing all penalties
    pub async fn next_round(&self, requester: &Requester) -> TrackerResult<usize> {
        requester.require_gm(GmAction::AdvanceRound)?;
        let cleared = self.combat.next_round();
        info!("{} advanced the round ({} penalty entries cleared)", requester.id, cleared);
        Ok(cleared)
    }

    pub async fn reset_penalties(
        &self,
        requester: &Requester,
        player_id: &str,
        kind: Option<ActionKind>,
    ) -> TrackerResult<bool> {
        requester.require_gm(GmAction::ResetPenalty)?;
        Ok(self.combat.reset_penalties(player_id, kind))
    }
}
