use async_trait::async_trait;
use chrono::{DateTime, Utc};
use media_cleaner_models::MediaItem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use crate::error::CatalogError;
use crate::memory::InMemoryCatalog;
use crate::traits::{CatalogProvider, CatalogSource};

/// Point-in-time copy of a catalog, stored as JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSnapshot {
    pub captured_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub items: Vec<MediaItem>,
}

impl CatalogSnapshot {
    pub fn new(items: Vec<MediaItem>, source: Option<String>) -> Self {
        Self {
            captured_at: Utc::now(),
            source,
            items,
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: CatalogSnapshot = serde_json::from_str(&content)?;
        info!(
            operation = "snapshot_load",
            path = %path.display(),
            items = snapshot.items.len(),
            "Loaded catalog snapshot"
        );
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn into_catalog(self) -> Result<InMemoryCatalog, CatalogError> {
        InMemoryCatalog::from_items(self.items)
    }
}

/// Re-reads a snapshot file on every scan
pub struct SnapshotFileProvider {
    path: PathBuf,
}

impl SnapshotFileProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl CatalogProvider for SnapshotFileProvider {
    fn provider_name(&self) -> &str {
        "snapshot"
    }

    async fn open(&self) -> Result<Arc<dyn CatalogSource>, CatalogError> {
        let path = self.path.clone();
        let snapshot = tokio::task::spawn_blocking(move || CatalogSnapshot::load(&path))
            .await
            .map_err(|e| CatalogError::other(format!("snapshot load task failed: {}", e)))??;
        Ok(Arc::new(snapshot.into_catalog()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_cleaner_models::{ItemKind, UserActivityRecord};

    #[test]
    fn test_snapshot_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("snapshot.json");

        let watched = Utc::now();
        let snapshot = CatalogSnapshot::new(
            vec![
                MediaItem::new("m1", ItemKind::Movie, "Heat")
                    .with_activity(UserActivityRecord::played("alice", watched)),
                MediaItem::new("m2", ItemKind::Movie, "Ronin"),
            ],
            Some("jellyfin".to_string()),
        );
        snapshot.save(&path).unwrap();

        let loaded = CatalogSnapshot::load(&path).unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.items[0].user_data[0].last_played, Some(watched));
        assert!(loaded.items[1].user_data.is_empty());
        assert_eq!(loaded.into_catalog().unwrap().len(), 2);
    }

    #[test]
    fn test_hand_written_snapshot_defaults() {
        let json = r#"{
            "captured_at": "2026-01-01T00:00:00Z",
            "items": [
                {"id": "show", "kind": "Series", "name": "Lost"},
                {"id": "s1", "kind": "Season", "parent_id": "show", "name": "Season 1"},
                {"id": "e1", "kind": "Episode", "parent_id": "s1", "name": "Pilot",
                 "user_data": [{"user_id": "bob", "last_played": "2025-06-01T20:00:00Z"}]}
            ]
        }"#;
        let snapshot: CatalogSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.source.is_none());
        let episode = &snapshot.items[2];
        assert_eq!(episode.user_data[0].play_count, 0);
        assert!(!episode.user_data[0].played);
        assert!(snapshot.into_catalog().is_ok());
    }

    #[tokio::test]
    async fn test_snapshot_file_provider_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        CatalogSnapshot::new(vec![MediaItem::new("m1", ItemKind::Movie, "Heat")], None)
            .save(&path)
            .unwrap();

        let provider = SnapshotFileProvider::new(path.clone());
        let first = provider.open().await.unwrap();
        let all = media_cleaner_models::ItemQuery::new().recursive(true);
        assert_eq!(first.query_items(&all).await.unwrap().len(), 1);

        CatalogSnapshot::new(
            vec![
                MediaItem::new("m1", ItemKind::Movie, "Heat"),
                MediaItem::new("m2", ItemKind::Movie, "Ronin"),
            ],
            None,
        )
        .save(&path)
        .unwrap();
        let second = provider.open().await.unwrap();
        assert_eq!(second.query_items(&all).await.unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = CatalogSnapshot::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }
}
