//! Durable storage for the last observed snapshot.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::entry::Snapshot;
use crate::Result;
use crate::utils::fs;

/// Storage for the snapshot carried between poll cycles.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved snapshot.
    ///
    /// Missing or unreadable state is not an error: it yields an empty snapshot.
    async fn load(&self) -> Snapshot;

    /// Replace the stored snapshot. Either the whole new snapshot becomes
    /// visible to the next `load`, or the previous one stays in place.
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Snapshot stored as one pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load(&self) -> Snapshot {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No saved snapshot, starting empty");
                return Snapshot::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read saved snapshot, starting empty");
                return Snapshot::new();
            }
        };

        match serde_json::from_str::<Snapshot>(&json) {
            Ok(snapshot) => {
                debug!(path = %self.path.display(), entries = snapshot.len(), "Loaded saved snapshot");
                snapshot
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    raw_len = json.len(),
                    error = %e,
                    "Saved snapshot is corrupt, starting empty"
                );
                Snapshot::new()
            }
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write_atomic(&self.path, json.as_bytes()).await?;
        debug!(path = %self.path.display(), entries = snapshot.len(), "Snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::NormalizedEntry;

    fn sample() -> Snapshot {
        let mut approved = NormalizedEntry::new("x2");
        approved.title = "Ship release ✅".to_string();
        approved.status = "Approved".to_string();
        approved.reminder = "D-day".to_string();
        approved.flag = true;
        approved.url = "https://www.notion.so/x2".to_string();
        approved.author = "Yuna".to_string();

        [NormalizedEntry::new("x1"), approved].into_iter().collect()
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state").join("snapshot.json"));
        let snapshot = sample();

        store.save(&snapshot).await.unwrap();

        assert_eq!(store.load().await, snapshot);
    }

    #[tokio::test]
    async fn test_saved_file_is_indented_object_keyed_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("snapshot.json"));
        store.save(&sample()).await.unwrap();

        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(raw.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["x2"]["status"], "Approved");
        assert_eq!(value["x1"]["status"], "No Status");
    }
}
