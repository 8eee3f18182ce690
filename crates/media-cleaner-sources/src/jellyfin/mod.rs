pub mod api;
pub mod loader;

pub use api::{JellyfinHttpClient, JellyfinItem, JellyfinUser, JellyfinUserData};
pub use loader::{JellyfinCatalogLoader, SnapshotBuilder};
