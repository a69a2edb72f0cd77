//! Relational backend: one row per player plus a singleton encounter row

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::Snapshot;
use crate::encounter::EncounterState;
use crate::resources::{PlayerRecord, ResourcePair, StatusEffects};

/// Player and encounter storage with database backing
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a store over an already-migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn load_all(&self) -> Result<Snapshot> {
        let rows: Vec<PlayerRow> = sqlx::query_as(
            r#"
            SELECT id, display_name, character_name,
                   hp_current, hp_max, mp_current, mp_max, ip_current, ip_max,
                   armor_current, armor_max, barrier_current, barrier_max, statuses
            FROM players
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut players = BTreeMap::new();
        for row in rows {
            let record = row.into_record()?;
            players.insert(record.id.clone(), record);
        }

        let encounter: Option<EncounterRow> =
            sqlx::query_as("SELECT active, combatants, started_at FROM encounter WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        let encounter = match encounter {
            Some(row) => row.into_state()?,
            None => EncounterState::default(),
        };

        Ok(Snapshot { players, encounter })
    }

    /// Upsert every player, drop rows no longer present, write the encounter.
    /// Runs in one transaction.
    pub async fn save_all(&self, snapshot: &Snapshot) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();

        for record in snapshot.players.values() {
            let statuses = serde_json::to_string(&record.statuses)?;
            sqlx::query(
                r#"
                INSERT INTO players (
                    id, display_name, character_name,
                    hp_current, hp_max, mp_current, mp_max, ip_current, ip_max,
                    armor_current, armor_max, barrier_current, barrier_max,
                    statuses, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    display_name = excluded.display_name,
                    character_name = excluded.character_name,
                    hp_current = excluded.hp_current,
                    hp_max = excluded.hp_max,
                    mp_current = excluded.mp_current,
                    mp_max = excluded.mp_max,
                    ip_current = excluded.ip_current,
                    ip_max = excluded.ip_max,
                    armor_current = excluded.armor_current,
                    armor_max = excluded.armor_max,
                    barrier_current = excluded.barrier_current,
                    barrier_max = excluded.barrier_max,
                    statuses = excluded.statuses,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&record.id)
            .bind(&record.display_name)
            .bind(&record.character_name)
            .bind(record.hp.current)
            .bind(record.hp.max)
            .bind(record.mp.current)
            .bind(record.mp.max)
            .bind(record.ip.current)
            .bind(record.ip.max)
            .bind(record.armor.current)
            .bind(record.armor.max)
            .bind(record.barrier.current)
            .bind(record.barrier.max)
            .bind(&statuses)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        let stored: Vec<(String,)> = sqlx::query_as("SELECT id FROM players")
            .fetch_all(&mut *tx)
            .await?;
        let keep: HashSet<&str> = snapshot.players.keys().map(String::as_str).collect();
        for (id,) in stored.iter().filter(|(id,)| !keep.contains(id.as_str())) {
            sqlx::query("DELETE FROM players WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let combatants = serde_json::to_string(&snapshot.encounter.combatants)?;
        let started_at = snapshot.encounter.started_at.map(|t| t.to_rfc3339());
        sqlx::query(
            r#"
            INSERT INTO encounter (id, active, combatants, started_at)
            VALUES (1, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                active = excluded.active,
                combatants = excluded.combatants,
                started_at = excluded.started_at
            "#,
        )
        .bind(snapshot.encounter.active)
        .bind(&combatants)
        .bind(&started_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!("Saved {} players to sqlite", snapshot.players.len());
        Ok(())
    }

    pub async fn delete_one(&self, player_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM players WHERE id = ?")
            .bind(player_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Row type for SQLite queries
#[derive(sqlx::FromRow)]
struct PlayerRow {
    id: String,
    display_name: String,
    character_name: String,
    hp_current: i64,
    hp_max: i64,
    mp_current: i64,
    mp_max: i64,
    ip_current: i64,
    ip_max: i64,
    armor_current: i64,
    armor_max: i64,
    barrier_current: i64,
    barrier_max: i64,
    statuses: String,
}

impl PlayerRow {
    fn into_record(self) -> Result<PlayerRecord> {
        let statuses: StatusEffects = serde_json::from_str(&self.statuses)?;
        Ok(PlayerRecord {
            id: self.id,
            display_name: self.display_name,
            character_name: self.character_name,
            hp: ResourcePair::new(self.hp_current, self.hp_max),
            mp: ResourcePair::new(self.mp_current, self.mp_max),
            ip: ResourcePair::new(self.ip_current, self.ip_max),
            armor: ResourcePair::new(self.armor_current, self.armor_max),
            barrier: ResourcePair::new(self.barrier_current, self.barrier_max),
            statuses,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EncounterRow {
    active: bool,
    combatants: String,
    started_at: Option<String>,
}

impl EncounterRow {
    fn into_state(self) -> Result<EncounterState> {
        let started_at = self
            .started_at
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|t| t.with_timezone(&Utc)))
            .transpose()?;
        Ok(EncounterState {
            active: self.active,
            combatants: serde_json::from_str(&self.combatants)?,
            started_at,
        })
    }
}
