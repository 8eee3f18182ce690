use chrono::{DateTime, Utc};
use media_cleaner_models::UserActivityRecord;

/// Latest playback across every user's record
///
/// Returns None for an empty slice (no signal at all) and when every record
/// lacks a timestamp. `Option`'s ordering puts None below any Some, which is
/// exactly the "never played ranks lowest" rule.
pub fn most_recent_activity(records: &[UserActivityRecord]) -> Option<DateTime<Utc>> {
    records.iter().map(|record| record.last_played).max().flatten()
}
