use serde::{Deserialize, Serialize};
use std::fmt;
use crate::user_activity::UserActivityRecord;

/// Opaque catalog identifier (Jellyfin item GUID, or any unique string for snapshots)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    Movie,
    Series,
    Season,
    Episode,
}

impl ItemKind {
    /// Kinds that must always hang off a parent (Season -> Series, Episode -> Season)
    pub fn requires_parent(&self) -> bool {
        matches!(self, ItemKind::Season | ItemKind::Episode)
    }

    /// Name used by Jellyfin's `Type` / `IncludeItemTypes` fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Movie => "Movie",
            ItemKind::Series => "Series",
            ItemKind::Season => "Season",
            ItemKind::Episode => "Episode",
        }
    }

    pub fn from_jellyfin_type(s: &str) -> Option<Self> {
        match s {
            "Movie" => Some(ItemKind::Movie),
            "Series" => Some(ItemKind::Series),
            "Season" => Some(ItemKind::Season),
            "Episode" => Some(ItemKind::Episode),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A read-only snapshot of one catalog entry
///
/// `user_data` holds one record per user that has ever touched the item.
/// An empty list means nobody has played it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: ItemId,
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ItemId>,
    pub name: String,
    #[serde(default)]
    pub user_data: Vec<UserActivityRecord>,
}

impl MediaItem {
    pub fn new(id: impl Into<ItemId>, kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            parent_id: None,
            name: name.into(),
            user_data: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<ItemId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_activity(mut self, record: UserActivityRecord) -> Self {
        self.user_data.push(record);
        self
    }

    /// True if at least one user has an activity record for this item
    pub fn is_watched_ever(&self) -> bool {
        !self.user_data.is_empty()
    }
}
