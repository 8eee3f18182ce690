pub mod traits;
pub mod error;
pub mod memory;
pub mod snapshot;
pub mod jellyfin;
pub mod progress;

pub use traits::{CatalogProvider, CatalogSource, FixedCatalog};
pub use error::CatalogError;
pub use memory::InMemoryCatalog;
pub use snapshot::{CatalogSnapshot, SnapshotFileProvider};
pub use jellyfin::{JellyfinCatalogLoader, JellyfinHttpClient};
pub use progress::ProgressTracker;
