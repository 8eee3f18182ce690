pub mod media;
pub mod query;
pub mod staleness;
pub mod user_activity;

pub use media::{ItemId, ItemKind, MediaItem};
pub use query::ItemQuery;
pub use staleness::{StalenessConfig, DEFAULT_CUTOFF_DAYS};
pub use user_activity::UserActivityRecord;
