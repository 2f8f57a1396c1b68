use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::models::{PoolSnapshot, SnapshotDocument};

/// Persists snapshots as JSON documents of `{ "snapshot": .., "positions": [..] }`
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<market_id>_<YYYYMMDD_HHMMSS>.json`
    pub fn path_for(&self, snapshot: &PoolSnapshot) -> PathBuf {
        self.root.join(format!(
            "{}_{}.json",
            snapshot.market_id(),
            snapshot.timestamp().format("%Y%m%d_%H%M%S")
        ))
    }

    /// Save under [`path_for`](Self::path_for) and return the written path
    pub fn store(&self, snapshot: &PoolSnapshot) -> Result<PathBuf> {
        let path = self.path_for(snapshot);
        Self::save(snapshot, &path)?;
        Ok(path)
    }

    /// Write a snapshot document, creating parent directories as needed
    pub fn save(snapshot: &PoolSnapshot, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&snapshot.to_document())?;
        fs::write(path, json)?;

        info!(path = %path.display(), positions = snapshot.num_positions(), "Snapshot saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<PoolSnapshot> {
        let contents = fs::read_to_string(path)?;
        let document: SnapshotDocument = serde_json::from_str(&contents)?;
        let snapshot = PoolSnapshot::from_document(document);

        info!(path = %path.display(), positions = snapshot.num_positions(), "Snapshot loaded");
        Ok(snapshot)
    }
}
