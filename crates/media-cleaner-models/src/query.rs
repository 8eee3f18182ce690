use serde::{Deserialize, Serialize};
use crate::media::{ItemId, ItemKind};

/// Filter passed to a catalog lookup
///
/// `item_ids` wins over `parent_id` when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuery {
    pub parent_id: Option<ItemId>,
    pub item_kinds: Option<Vec<ItemKind>>,
    pub item_ids: Option<Vec<ItemId>>,
    pub recursive: bool,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct children of `parent_id`
    pub fn children_of(parent_id: ItemId) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::default()
        }
    }

    /// Exact lookup by id
    pub fn by_ids(ids: Vec<ItemId>) -> Self {
        Self {
            item_ids: Some(ids),
            ..Self::default()
        }
    }

    pub fn with_kinds(mut self, kinds: &[ItemKind]) -> Self {
        self.item_kinds = Some(kinds.to_vec());
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// True if `kind` passes the kind filter (no filter accepts everything)
    pub fn accepts_kind(&self, kind: ItemKind) -> bool {
        self.item_kinds
            .as_ref()
            .map(|kinds| kinds.contains(&kind))
            .unwrap_or(true)
    }
}
