use async_trait::async_trait;
use media_cleaner_models::{ItemId, ItemQuery, MediaItem};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use crate::error::CatalogError;
use crate::traits::CatalogSource;

/// Catalog snapshot held as an arena of items indexed by id
///
/// Children are looked up through a parent index instead of object links, so
/// walking Series -> Season -> Episode is a series of plain lookups.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: Vec<MediaItem>,
    index: HashMap<ItemId, usize>,
    children: HashMap<ItemId, Vec<usize>>,
    roots: Vec<usize>,
}

impl InMemoryCatalog {
    /// Build the arena, rejecting duplicate ids and parentless seasons/episodes
    pub fn from_items(items: Vec<MediaItem>) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for item in items {
            catalog.insert(item)?;
        }
        debug!(
            "InMemoryCatalog: {} items, {} top-level",
            catalog.items.len(),
            catalog.roots.len()
        );
        Ok(catalog)
    }

    fn insert(&mut self, item: MediaItem) -> Result<(), CatalogError> {
        if item.kind.requires_parent() && item.parent_id.is_none() {
            return Err(CatalogError::Orphan {
                id: item.id,
                kind: item.kind,
            });
        }
        if self.index.contains_key(&item.id) {
            return Err(CatalogError::other(format!("duplicate item id {}", item.id)));
        }

        let position = self.items.len();
        self.index.insert(item.id.clone(), position);
        match &item.parent_id {
            Some(parent_id) => self.children.entry(parent_id.clone()).or_default().push(position),
            None => self.roots.push(position),
        }
        self.items.push(item);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&MediaItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<MediaItem> {
        self.items
    }

    fn direct_children(&self, parent_id: &ItemId) -> &[usize] {
        self.children.get(parent_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pre-order walk below `parent_id`, in snapshot order
    fn descendants(&self, parent_id: &ItemId) -> Vec<usize> {
        let mut found = Vec::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<usize> = self.direct_children(parent_id).iter().rev().copied().collect();

        while let Some(position) = stack.pop() {
            if !visited.insert(position) {
                continue;
            }
            found.push(position);
            let id = &self.items[position].id;
            stack.extend(self.direct_children(id).iter().rev().copied());
        }
        found
    }

    /// Synchronous form of `CatalogSource::query_items`
    pub fn select(&self, query: &ItemQuery) -> Vec<MediaItem> {
        let positions: Vec<usize> = if let Some(ids) = &query.item_ids {
            let mut seen = HashSet::new();
            ids.iter()
                .filter_map(|id| self.index.get(id).copied())
                .filter(|position| seen.insert(*position))
                .collect()
        } else if let Some(parent_id) = &query.parent_id {
            if query.recursive {
                self.descendants(parent_id)
            } else {
                self.direct_children(parent_id).to_vec()
            }
        } else if query.recursive {
            (0..self.items.len()).collect()
        } else {
            self.roots.clone()
        };

        positions
            .into_iter()
            .map(|position| &self.items[position])
            .filter(|item| query.accepts_kind(item.kind))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    fn source_name(&self) -> &str {
        "memory"
    }

    async fn query_items(&self, query: &ItemQuery) -> Result<Vec<MediaItem>, CatalogError> {
        Ok(self.select(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_cleaner_models::ItemKind;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::from_items(vec![
            MediaItem::new("show", ItemKind::Series, "The Wire"),
            MediaItem::new("s1", ItemKind::Season, "Season 1").with_parent("show"),
            MediaItem::new("s1e1", ItemKind::Episode, "The Target").with_parent("s1"),
            MediaItem::new("s1e2", ItemKind::Episode, "The Detail").with_parent("s1"),
            MediaItem::new("s2", ItemKind::Season, "Season 2").with_parent("show"),
            MediaItem::new("s2e1", ItemKind::Episode, "Ebb Tide").with_parent("s2"),
            MediaItem::new("movie", ItemKind::Movie, "Heat"),
        ])
        .unwrap()
    }

    fn ids(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn test_direct_children() {
        let catalog = catalog();
        let seasons = catalog.select(&ItemQuery::children_of("show".into()));
        assert_eq!(ids(&seasons), vec!["s1", "s2"]);

        let episodes = catalog.select(&ItemQuery::children_of("s1".into()).with_kinds(&[ItemKind::Episode]));
        assert_eq!(ids(&episodes), vec!["s1e1", "s1e2"]);
    }

    #[test]
    fn test_recursive_children_are_pre_order() {
        let catalog = catalog();
        let all = catalog.select(&ItemQuery::children_of("show".into()).recursive(true));
        assert_eq!(ids(&all), vec!["s1", "s1e1", "s1e2", "s2", "s2e1"]);

        let episodes = catalog.select(
            &ItemQuery::children_of("show".into())
                .recursive(true)
                .with_kinds(&[ItemKind::Episode]),
        );
        assert_eq!(ids(&episodes), vec!["s1e1", "s1e2", "s2e1"]);
    }

    #[test]
    fn test_top_level_and_whole_catalog() {
        let catalog = catalog();
        let top = catalog.select(&ItemQuery::new());
        assert_eq!(ids(&top), vec!["show", "movie"]);

        let roots = catalog.select(
            &ItemQuery::new()
                .recursive(true)
                .with_kinds(&[ItemKind::Movie, ItemKind::Series]),
        );
        assert_eq!(ids(&roots), vec!["show", "movie"]);
        assert_eq!(catalog.select(&ItemQuery::new().recursive(true)).len(), 7);
    }

    #[test]
    fn test_by_ids_skips_unknown_and_duplicates() {
        let catalog = catalog();
        let found = catalog.select(&ItemQuery::by_ids(vec![
            "s2".into(),
            "missing".into(),
            "s1".into(),
            "s2".into(),
        ]));
        assert_eq!(ids(&found), vec!["s2", "s1"]);
    }

    #[test]
    fn test_unknown_parent_is_empty() {
        let catalog = catalog();
        assert!(catalog.select(&ItemQuery::children_of("nope".into())).is_empty());
    }

    #[test]
    fn test_rejects_orphan_episode() {
        let result = InMemoryCatalog::from_items(vec![MediaItem::new("e", ItemKind::Episode, "Loose")]);
        assert!(matches!(result, Err(CatalogError::Orphan { kind: ItemKind::Episode, .. })));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = InMemoryCatalog::from_items(vec![
            MediaItem::new("m", ItemKind::Movie, "One"),
            MediaItem::new("m", ItemKind::Movie, "Two"),
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_query_items_matches_select() {
        let catalog = catalog();
        let query = ItemQuery::children_of("s2".into());
        let items = catalog.query_items(&query).await.unwrap();
        assert_eq!(items, catalog.select(&query));
    }
}
