//! clashd - tabletop clash tracker daemon
//!
//! Tracks character resources, status effects, the encounter roster and
//! per-round penalties, and resolves two-die rolls for a chat gateway.

pub mod api;
pub mod combat;
pub mod config;
pub mod db;
pub mod encounter;
pub mod error;
pub mod permissions;
pub mod persistence;
pub mod resources;
pub mod tracker;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use api::AppState;
use combat::{DiceSource, RandomDice};
use db::Database;
use permissions::PermissionManager;
use persistence::{Backend, JsonStore, MemoryStore, SqliteStore};
use tracker::Tracker;

pub use config::{Config, StorageConfig};

/// The clashd server instance
pub struct Server {
    config: Config,
    state: AppState,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: Config) -> Result<Self> {
        Self::with_dice(config, Arc::new(RandomDice)).await
    }

    /// Create a server rolling with the given dice
    pub async fn with_dice(config: Config, dice: Arc<dyn DiceSource>) -> Result<Self> {
        let (backend, db) = match &config.storage {
            StorageConfig::Memory => (Backend::Memory(MemoryStore::new()), None),
            StorageConfig::Json { path } => (Backend::Json(JsonStore::new(path.clone())), None),
            StorageConfig::Sqlite { path } => {
                let db = Arc::new(Database::new(Some(path.as_str())).await?);
                (Backend::Sqlite(SqliteStore::new(db.pool().clone())), Some(db))
            }
        };

        let tracker = Tracker::open(backend, dice, config.tracker_options()).await?;
        let permissions = PermissionManager::new(config.gm_ids.iter().cloned());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            state: AppState {
                tracker: Arc::new(tracker),
                permissions: Arc::new(permissions),
                db,
            },
            config,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Shared state handed to request handlers
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router
    pub fn router(&self) -> Router {
        api::router(self.state.clone())
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("clashd listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        // Drain queued writes before exiting
        self.state.tracker.sync().await;
        info!("clashd shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
