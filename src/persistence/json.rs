//! Single JSON document backend

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::Snapshot;

/// Stores all state in one pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; a missing file is an empty table
    pub async fn load_all(&self) -> Result<Snapshot> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No state file at {}, starting empty", self.path.display());
                return Ok(Snapshot::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        serde_json::from_slice(&raw).with_context(|| format!("parsing {}", self.path.display()))
    }

    /// Write the whole document through a temp file and rename
    pub async fn save_all(&self, snapshot: &Snapshot) -> Result<()> {
        let body = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;

        debug!(
            "Saved {} players to {}",
            snapshot.players.len(),
            self.path.display()
        );
        Ok(())
    }

    pub async fn delete_one(&self, player_id: &str) -> Result<bool> {
        let mut snapshot = self.load_all().await?;
        if snapshot.players.remove(player_id).is_none() {
            return Ok(false);
        }
        self.save_all(&snapshot).await?;
        Ok(true)
    }
}
