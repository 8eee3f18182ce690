use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user playback metadata for a single item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserActivityRecord {
    pub user_id: String,
    /// None means the user has a record but never finished a playback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<DateTime<Utc>>,
    #[serde(default)]
    pub play_count: u32,
    #[serde(default)]
    pub played: bool,
}

impl UserActivityRecord {
    pub fn new(user_id: impl Into<String>, last_played: Option<DateTime<Utc>>) -> Self {
        Self {
            user_id: user_id.into(),
            last_played,
            play_count: 0,
            played: false,
        }
    }

    /// A record for a completed playback at `at`
    pub fn played(user_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            last_played: Some(at),
            play_count: 1,
            played: true,
        }
    }
}
