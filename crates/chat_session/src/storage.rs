//! Snapshot storage trait and file implementation
//!
//! Snapshots are single JSON files; saved names are date-stamped
//! (`<name>_<YYYY-MM-DD>.json`) under the storage directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chat_core::ChatSnapshot;
use chrono::Local;
use tokio::fs;

use crate::error::{Result, SessionError};

/// Snapshot storage trait
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Persist a snapshot under a logical name; returns the file written.
    async fn save_snapshot(&self, name: &str, snapshot: &ChatSnapshot) -> Result<PathBuf>;

    /// Load a snapshot from a concrete path.
    async fn load_snapshot(&self, path: &Path) -> Result<ChatSnapshot>;

    /// All snapshot files currently stored.
    async fn list_snapshots(&self) -> Result<Vec<PathBuf>>;
}

/// File-based snapshot storage
#[derive(Clone)]
pub struct FileSnapshotStorage {
    base_dir: PathBuf,
}

impl FileSnapshotStorage {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        let today = Local::now().format("%Y-%m-%d");
        self.base_dir.join(format!("{name}_{today}.json"))
    }
}

#[async_trait]
impl SnapshotStorage for FileSnapshotStorage {
    async fn save_snapshot(&self, name: &str, snapshot: &ChatSnapshot) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir).await?;

        let path = self.snapshot_path(name);
        let contents = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, contents).await?;
        Ok(path)
    }

    async fn load_snapshot(&self, path: &Path) -> Result<ChatSnapshot> {
        if !path.exists() {
            return Err(SessionError::SnapshotNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path).await?;
        let snapshot: ChatSnapshot = serde_json::from_str(&contents)?;
        Ok(snapshot)
    }

    async fn list_snapshots(&self) -> Result<Vec<PathBuf>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = fs::read_dir(&self.base_dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::ConversationTree;
    use tempfile::tempdir;

    fn sample_snapshot() -> ChatSnapshot {
        let tree = ConversationTree::new("You are helpful");
        ChatSnapshot {
            model: "gpt-4o".to_string(),
            total_tokens: 42,
            conversation_tree: Some(tree.to_record()),
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let storage = FileSnapshotStorage::new(dir.path());

        let snapshot = sample_snapshot();
        let path = storage.save_snapshot("test", &snapshot).await.unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("test_"));

        let loaded = storage.load_snapshot(&path).await.unwrap();
        assert_eq!(loaded.model, "gpt-4o");
        assert_eq!(loaded.total_tokens, 42);
        assert!(loaded.conversation_tree.is_some());
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileSnapshotStorage::new(dir.path());

        let result = storage.load_snapshot(&dir.path().join("missing.json")).await;
        assert!(matches!(result, Err(SessionError::SnapshotNotFound(_))));
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_a_serialization_error() {
        let dir = tempdir().unwrap();
        let storage = FileSnapshotStorage::new(dir.path());
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").await.unwrap();

        let result = storage.load_snapshot(&path).await;
        assert!(matches!(result, Err(SessionError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_list_snapshots() {
        let dir = tempdir().unwrap();
        let storage = FileSnapshotStorage::new(dir.path());

        assert!(storage.list_snapshots().await.unwrap().is_empty());
        storage.save_snapshot("a", &sample_snapshot()).await.unwrap();
        storage.save_snapshot("b", &sample_snapshot()).await.unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").await.unwrap();

        let listed = storage.list_snapshots().await.unwrap();
        assert_eq!(listed.len(), 2);
    }
}
