use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use media_cleaner_models::{ItemId, ItemKind, ItemQuery, MediaItem, UserActivityRecord};
use media_cleaner_sources::{CatalogError, CatalogSource, InMemoryCatalog};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Day `n` of a fixed timeline
pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

pub fn played(user: &str, on_day: i64) -> UserActivityRecord {
    UserActivityRecord::played(user, day(on_day))
}

pub fn movie(id: &str, name: &str, records: Vec<UserActivityRecord>) -> MediaItem {
    let mut item = MediaItem::new(id, ItemKind::Movie, name);
    item.user_data = records;
    item
}

pub fn series(id: &str, name: &str) -> MediaItem {
    MediaItem::new(id, ItemKind::Series, name)
}

pub fn season(id: &str, series_id: &str) -> MediaItem {
    MediaItem::new(id, ItemKind::Season, format!("Season {}", id)).with_parent(series_id)
}

pub fn episode(id: &str, season_id: &str, last_played_day: Option<i64>) -> MediaItem {
    let item = MediaItem::new(id, ItemKind::Episode, format!("Episode {}", id)).with_parent(season_id);
    match last_played_day {
        Some(n) => item.with_activity(played("alice", n)),
        None => item,
    }
}

pub fn catalog(items: Vec<MediaItem>) -> InMemoryCatalog {
    InMemoryCatalog::from_items(items).unwrap()
}

pub fn ids(items: &[MediaItem]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}

/// Wraps an in-memory catalog, recording queries and injecting failures or cancellation
pub struct ScriptedCatalog {
    inner: InMemoryCatalog,
    queries: Mutex<Vec<ItemQuery>>,
    fail_on_parent: Option<ItemId>,
    cancel_on_parent: Option<(ItemId, CancellationToken)>,
}

impl ScriptedCatalog {
    pub fn new(inner: InMemoryCatalog) -> Self {
        Self {
            inner,
            queries: Mutex::new(Vec::new()),
            fail_on_parent: None,
            cancel_on_parent: None,
        }
    }

    pub fn failing_on(mut self, parent_id: &str) -> Self {
        self.fail_on_parent = Some(ItemId::new(parent_id));
        self
    }

    pub fn cancelling_on(mut self, parent_id: &str, token: CancellationToken) -> Self {
        self.cancel_on_parent = Some((ItemId::new(parent_id), token));
        self
    }

    pub fn queries(&self) -> Vec<ItemQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for ScriptedCatalog {
    fn source_name(&self) -> &str {
        "scripted"
    }

    async fn query_items(&self, query: &ItemQuery) -> Result<Vec<MediaItem>, CatalogError> {
        self.queries.lock().unwrap().push(query.clone());

        if let (Some(fail), Some(parent)) = (&self.fail_on_parent, &query.parent_id) {
            if fail == parent {
                return Err(CatalogError::other(format!("backend unavailable for {}", parent)));
            }
        }
        if let (Some((trigger, token)), Some(parent)) = (&self.cancel_on_parent, &query.parent_id) {
            if trigger == parent {
                token.cancel();
            }
        }
        Ok(self.inner.select(query))
    }
}
