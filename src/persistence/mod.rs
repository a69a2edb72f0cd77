//! Persistence backends and the background writer
//!
//! Provides:
//! - A load/save/delete contract over player sheets and the encounter
//! - JSON document, SQLite and in-memory backends
//! - A single writer task so flushes land in submission order

mod json;
mod sqlite;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::encounter::EncounterState;
use crate::resources::PlayerRecord;

pub use json::JsonStore;
pub use sqlite::SqliteStore;

/// Everything that survives a restart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub players: BTreeMap<String, PlayerRecord>,
    #[serde(default)]
    pub encounter: EncounterState,
}

/// Volatile backend holding the last saved snapshot
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last snapshot written to this store
    pub fn saved(&self) -> Snapshot {
        self.saved.lock().clone()
    }
}

/// Storage backend selected at startup
#[derive(Debug, Clone)]
pub enum Backend {
    Memory(MemoryStore),
    Json(JsonStore),
    Sqlite(SqliteStore),
}

impl Backend {
    /// Load all player sheets and the encounter
    pub async fn load_all(&self) -> Result<Snapshot> {
        match self {
            Backend::Memory(store) => Ok(store.saved()),
            Backend::Json(store) => store.load_all().await,
            Backend::Sqlite(store) => store.load_all().await,
        }
    }

    /// Replace stored state with the given snapshot
    pub async fn save_all(&self, snapshot: &Snapshot) -> Result<()> {
        match self {
            Backend::Memory(store) => {
                *store.saved.lock() = snapshot.clone();
                Ok(())
            }
            Backend::Json(store) => store.save_all(snapshot).await,
            Backend::Sqlite(store) => store.save_all(snapshot).await,
        }
    }

    /// Remove a single player sheet; returns false if it was not stored
    pub async fn delete_one(&self, player_id: &str) -> Result<bool> {
        match self {
            Backend::Memory(store) => Ok(store.saved.lock().players.remove(player_id).is_some()),
            Backend::Json(store) => store.delete_one(player_id).await,
            Backend::Sqlite(store) => store.delete_one(player_id).await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Memory(_) => "memory",
            Backend::Json(_) => "json",
            Backend::Sqlite(_) => "sqlite",
        }
    }
}

enum FlushOp {
    Save(Snapshot),
    Delete(String),
    Sync(oneshot::Sender<()>),
}

/// Fire-and-forget handle to the persistence writer task.
/// Failures are logged; in-memory state stays authoritative.
#[derive(Debug, Clone)]
pub struct Flusher {
    tx: mpsc::UnboundedSender<FlushOp>,
}

impl std::fmt::Debug for FlushOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlushOp::Save(s) => write!(f, "Save({} players)", s.players.len()),
            FlushOp::Delete(id) => write!(f, "Delete({})", id),
            FlushOp::Sync(_) => write!(f, "Sync"),
        }
    }
}

impl Flusher {
    /// Spawn the writer task for a backend
    pub fn spawn(backend: Backend) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(backend, rx));
        Self { tx }
    }

    /// Queue a full save
    pub fn save(&self, snapshot: Snapshot) {
        self.submit(FlushOp::Save(snapshot));
    }

    /// Queue removal of one player
    pub fn delete(&self, player_id: &str) {
        self.submit(FlushOp::Delete(player_id.to_string()));
    }

    /// Wait until everything queued so far has been written
    pub async fn sync(&self) {
        let (tx, rx) = oneshot::channel();
        self.submit(FlushOp::Sync(tx));
        let _ = rx.await;
    }

    fn submit(&self, op: FlushOp) {
        if let Err(e) = self.tx.send(op) {
            warn!("Persistence writer has stopped, dropping {:?}", e.0);
        }
    }
}

async fn run_writer(backend: Backend, mut rx: mpsc::UnboundedReceiver<FlushOp>) {
    debug!("Persistence writer started ({})", backend.name());
    while let Some(op) = rx.recv().await {
        match op {
            FlushOp::Save(snapshot) => {
                if let Err(e) = backend.save_all(&snapshot).await {
                    warn!("Failed to save tracker state to {}: {:#}", backend.name(), e);
                }
            }
            FlushOp::Delete(player_id) => match backend.delete_one(&player_id).await {
                Ok(false) => debug!("Player {} was not stored, nothing to delete", player_id),
                Ok(true) => {}
                Err(e) => warn!("Failed to delete player {}: {:#}", player_id, e),
            },
            FlushOp::Sync(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Persistence writer stopped");
}
