//! Whole-store JSON snapshots
//!
//! Every mutation rewrites the full document. Saves go to a temporary file
//! in the same directory and are renamed over the target, so an interrupted
//! write leaves the previous snapshot intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ContinuumError, Result};
use crate::memory::types::{Cluster, Record};

/// Persisted state of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Record id to record
    #[serde(default)]
    pub memories: BTreeMap<Uuid, Record>,
    /// Cluster id to cluster
    #[serde(default)]
    pub clusters: BTreeMap<Uuid, Cluster>,
}

/// Location of the snapshot document on disk
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Load the snapshot, falling back to an empty one.
    ///
    /// A missing or unreadable document is not an error: the store starts
    /// empty and the condition is logged.
    pub async fn load(&self) -> Snapshot {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "No snapshot found at {}, starting with an empty store",
                    self.path.display()
                );
                return Snapshot::default();
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read snapshot {}, starting with an empty store: {}",
                    self.path.display(),
                    e
                );
                return Snapshot::default();
            }
        };

        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => {
                tracing::info!(
                    memories = snapshot.memories.len(),
                    clusters = snapshot.clusters.len(),
                    "Loaded snapshot from {}",
                    self.path.display()
                );
                snapshot
            }
            Err(e) => {
                tracing::warn!(
                    "Snapshot {} is corrupt, starting with an empty store: {}",
                    self.path.display(),
                    e
                );
                Snapshot::default()
            }
        }
    }

    /// Atomically replace the snapshot on disk
    pub async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ContinuumError::Storage(format!(
                    "Failed to create snapshot directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &bytes).await.map_err(|e| {
            ContinuumError::Storage(format!(
                "Failed to write snapshot {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| {
                ContinuumError::Storage(format!(
                    "Failed to replace snapshot {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        tracing::debug!(
            memories = snapshot.memories.len(),
            clusters = snapshot.clusters.len(),
            bytes = bytes.len(),
            "Saved snapshot"
        );
        Ok(())
    }
}
