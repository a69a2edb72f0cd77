//! Database module - SQLite pool and tracker schema


use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Database handle wrapping SQLite connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    /// If path is None, uses in-memory database (for testing)
    pub async fn new(path: Option<&str>) -> Result<Self> {
        let conn_str = match path {
            Some(p) => format!("sqlite:{}?mode=rwc", p),
            None => "sqlite::memory:".to_string(),
        };

        let options = SqliteConnectOptions::from_str(&conn_str)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // An in-memory database lives only as long as its connection
        let pool_options = match path {
            Some(_) => SqlitePoolOptions::new().max_connections(4),
            None => SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        };

        let pool = pool_options.connect_with(options).await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        // One row per character sheet; statuses kept as a JSON array
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS players (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                character_name TEXT NOT NULL DEFAULT '',
                hp_current INTEGER NOT NULL DEFAULT 0,
                hp_max INTEGER NOT NULL DEFAULT 0,
                mp_current INTEGER NOT NULL DEFAULT 0,
                mp_max INTEGER NOT NULL DEFAULT 0,
                ip_current INTEGER NOT NULL DEFAULT 0,
                ip_max INTEGER NOT NULL DEFAULT 0,
                armor_current INTEGER NOT NULL DEFAULT 0,
                armor_max INTEGER NOT NULL DEFAULT 0,
                barrier_current INTEGER NOT NULL DEFAULT 0,
                barrier_max INTEGER NOT NULL DEFAULT 0,
                statuses TEXT NOT NULL DEFAULT '[]',
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Singleton encounter row
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS encounter (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                active INTEGER NOT NULL DEFAULT 0,
                combatants TEXT NOT NULL DEFAULT '[]',
                started_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations complete");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check if database is healthy
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
