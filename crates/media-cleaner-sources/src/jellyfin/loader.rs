use async_trait::async_trait;
use media_cleaner_config::JellyfinConfig;
use media_cleaner_models::{ItemId, ItemKind, MediaItem, UserActivityRecord};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use crate::error::CatalogError;
use crate::jellyfin::api::{JellyfinHttpClient, JellyfinItem};
use crate::memory::InMemoryCatalog;
use crate::progress::ProgressTracker;
use crate::snapshot::CatalogSnapshot;
use crate::traits::{CatalogProvider, CatalogSource};

/// Merges per-user Jellyfin views into one item list
///
/// Jellyfin only exposes user data from one user's point of view, so the same
/// item arrives once per user; each user that touched it adds one record.
#[derive(Default)]
pub struct SnapshotBuilder {
    items: HashMap<String, MediaItem>,
    order: Vec<String>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user_items(&mut self, user_id: &str, page: Vec<JellyfinItem>, tracker: &mut ProgressTracker) {
        for raw in page {
            let Some(kind) = ItemKind::from_jellyfin_type(&raw.type_) else {
                tracker.record_skipped("unsupported type");
                continue;
            };

            let touched = raw.user_data.as_ref().filter(|data| data.is_touched()).map(|data| {
                UserActivityRecord {
                    user_id: user_id.to_string(),
                    last_played: data.last_played(),
                    play_count: data.play_count,
                    played: data.played,
                }
            });

            if !self.items.contains_key(&raw.id) {
                let parent_id = match kind {
                    ItemKind::Movie | ItemKind::Series => None,
                    ItemKind::Season => raw.series_id.clone().or_else(|| raw.parent_id.clone()),
                    ItemKind::Episode => raw.season_id.clone().or_else(|| raw.parent_id.clone()),
                };
                let item = MediaItem {
                    id: ItemId::new(raw.id.clone()),
                    kind,
                    parent_id: parent_id.map(ItemId::new),
                    name: raw.name.clone().unwrap_or_default(),
                    user_data: Vec::new(),
                };
                self.order.push(raw.id.clone());
                self.items.insert(raw.id.clone(), item);
            }

            if let Some(record) = touched {
                if let Some(item) = self.items.get_mut(&raw.id) {
                    item.user_data.push(record);
                    tracker.record_touched();
                }
            }
            tracker.record_loaded();
        }
    }

    /// Snapshot order, minus seasons without a known series and episodes without a known season
    pub fn finish(self, tracker: &mut ProgressTracker) -> Vec<MediaItem> {
        let Self { mut items, order } = self;

        let series: HashSet<&str> = order
            .iter()
            .filter(|id| items.get(*id).map(|item| item.kind == ItemKind::Series).unwrap_or(false))
            .map(String::as_str)
            .collect();

        let seasons: HashSet<String> = order
            .iter()
            .filter_map(|id| items.get(id))
            .filter(|item| item.kind == ItemKind::Season)
            .filter(|item| {
                item.parent_id
                    .as_ref()
                    .map(|parent| series.contains(parent.as_str()))
                    .unwrap_or(false)
            })
            .map(|item| item.id.as_str().to_string())
            .collect();

        let mut kept = Vec::with_capacity(order.len());
        for id in &order {
            let Some(item) = items.remove(id) else { continue };
            let keep = match item.kind {
                ItemKind::Movie | ItemKind::Series => true,
                ItemKind::Season => seasons.contains(id),
                ItemKind::Episode => item
                    .parent_id
                    .as_ref()
                    .map(|parent| seasons.contains(parent.as_str()))
                    .unwrap_or(false),
            };
            if keep {
                kept.push(item);
            } else {
                warn!(
                    "Jellyfin: dropping {} '{}' ({}) with no resolvable parent",
                    item.kind, item.name, item.id
                );
                tracker.record_skipped("orphan");
            }
        }
        kept
    }
}

/// Reads the whole Jellyfin library into a catalog snapshot
pub struct JellyfinCatalogLoader {
    client: JellyfinHttpClient,
    page_size: u32,
}

impl JellyfinCatalogLoader {
    pub fn new(client: JellyfinHttpClient, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    /// Build a loader for the configured server; the API key is kept out of config.toml
    pub fn from_config(config: &JellyfinConfig, api_key: &str) -> anyhow::Result<Self> {
        if !config.enabled {
            anyhow::bail!("Jellyfin is disabled in the configuration");
        }
        let client = JellyfinHttpClient::new(
            &config.server_url,
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::new(client, config.page_size))
    }

    pub async fn load_snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let users = self.client.get_users().await?;
        if users.is_empty() {
            return Err(CatalogError::other("Jellyfin returned no users"));
        }
        info!(
            operation = "jellyfin_load_start",
            server = self.client.server_url(),
            users = users.len(),
            "Loading Jellyfin catalog"
        );

        let mut builder = SnapshotBuilder::new();
        let mut tracker = ProgressTracker::new(0, 1000);

        for user in &users {
            let mut start_index = 0;
            loop {
                let page = self.client.get_user_items(&user.id, start_index, self.page_size).await?;
                let fetched = page.items.len();
                if start_index == 0 {
                    tracker.set_total(tracker.processed() + page.total_record_count);
                }
                builder.add_user_items(&user.id, page.items, &mut tracker);
                tracker.log_progress();

                start_index += fetched;
                if fetched == 0 || start_index >= page.total_record_count {
                    break;
                }
            }
        }

        let items = builder.finish(&mut tracker);
        tracker.log_summary("Jellyfin catalog load");
        Ok(CatalogSnapshot::new(items, Some("jellyfin".to_string())))
    }

    pub async fn load_catalog(&self) -> Result<InMemoryCatalog, CatalogError> {
        self.load_snapshot().await?.into_catalog()
    }
}

#[async_trait]
impl CatalogProvider for JellyfinCatalogLoader {
    fn provider_name(&self) -> &str {
        "jellyfin"
    }

    async fn open(&self) -> Result<Arc<dyn CatalogSource>, CatalogError> {
        Ok(Arc::new(self.load_catalog().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jellyfin::api::JellyfinUserData;

    fn raw(id: &str, type_: &str, parent: Option<&str>, user_data: Option<JellyfinUserData>) -> JellyfinItem {
        JellyfinItem {
            id: id.to_string(),
            name: Some(format!("{} name", id)),
            type_: type_.to_string(),
            parent_id: parent.map(str::to_string),
            series_id: None,
            season_id: None,
            user_data,
        }
    }

    fn played(date: &str) -> Option<JellyfinUserData> {
        Some(JellyfinUserData {
            play_count: 1,
            played: true,
            playback_position_ticks: 0,
            last_played_date: Some(date.to_string()),
        })
    }

    fn untouched() -> Option<JellyfinUserData> {
        Some(JellyfinUserData::default())
    }

    #[test]
    fn test_merges_user_views_into_one_item() {
        let mut tracker = ProgressTracker::new(0, 100);
        let mut builder = SnapshotBuilder::new();
        builder.add_user_items(
            "alice",
            vec![raw("m1", "Movie", Some("library"), played("2025-01-01T00:00:00Z"))],
            &mut tracker,
        );
        builder.add_user_items(
            "bob",
            vec![raw("m1", "Movie", Some("library"), untouched())],
            &mut tracker,
        );
        builder.add_user_items(
            "carol",
            vec![raw("m1", "Movie", Some("library"), played("2025-02-01T00:00:00Z"))],
            &mut tracker,
        );

        let items = builder.finish(&mut tracker);
        assert_eq!(items.len(), 1);
        let movie = &items[0];
        assert!(movie.parent_id.is_none());
        let users: Vec<&str> = movie.user_data.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(users, vec!["alice", "carol"]);
    }

    #[test]
    fn test_episode_prefers_season_id_and_drops_orphans() {
        let mut tracker = ProgressTracker::new(0, 100);
        let mut builder = SnapshotBuilder::new();

        let mut episode = raw("e1", "Episode", Some("folder"), untouched());
        episode.season_id = Some("s1".to_string());
        let mut season = raw("s1", "Season", Some("show"), None);
        season.series_id = Some("show".to_string());

        builder.add_user_items(
            "alice",
            vec![
                raw("show", "Series", Some("library"), None),
                season,
                episode,
                raw("e2", "Episode", Some("ghost-season"), None),
                raw("s9", "Season", None, None),
                raw("b1", "BoxSet", None, None),
            ],
            &mut tracker,
        );

        let items = builder.finish(&mut tracker);
        let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["show", "s1", "e1"]);
        assert_eq!(items[2].parent_id.as_ref().unwrap().as_str(), "s1");
        assert_eq!(tracker.skipped(), 3);

        assert!(InMemoryCatalog::from_items(items).is_ok());
    }

    #[test]
    fn test_falls_back_to_parent_id_without_typed_ids() {
        let mut tracker = ProgressTracker::new(0, 100);
        let mut builder = SnapshotBuilder::new();
        builder.add_user_items(
            "alice",
            vec![
                raw("show", "Series", Some("library"), None),
                raw("s1", "Season", Some("show"), None),
                raw("e1", "Episode", Some("s1"), played("2025-01-01T00:00:00Z")),
            ],
            &mut tracker,
        );

        let items = builder.finish(&mut tracker);
        let parents: Vec<Option<&str>> = items
            .iter()
            .map(|item| item.parent_id.as_ref().map(|id| id.as_str()))
            .collect();
        assert_eq!(parents, vec![None, Some("show"), Some("s1")]);
    }

    #[test]
    fn test_from_config() {
        let mut config = JellyfinConfig::new("http://jellyfin.local:8096/".to_string());
        let loader = JellyfinCatalogLoader::from_config(&config, "secret").unwrap();
        assert_eq!(loader.client.server_url(), "http://jellyfin.local:8096");
        assert_eq!(loader.page_size, 500);

        config.enabled = false;
        assert!(JellyfinCatalogLoader::from_config(&config, "secret").is_err());
    }
}
