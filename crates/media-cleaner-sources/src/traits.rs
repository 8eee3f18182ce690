use async_trait::async_trait;
use media_cleaner_models::{ItemQuery, MediaItem};
use std::sync::Arc;
use crate::error::CatalogError;

/// Read-only lookup into a media catalog
///
/// Every scan step goes through `query_items`; implementations own their own
/// timeout and retry policy. Errors must be surfaced, never mapped to an empty
/// result.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn source_name(&self) -> &str;

    async fn query_items(&self, query: &ItemQuery) -> Result<Vec<MediaItem>, CatalogError>;
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Arc<T> {
    fn source_name(&self) -> &str {
        (**self).source_name()
    }

    async fn query_items(&self, query: &ItemQuery) -> Result<Vec<MediaItem>, CatalogError> {
        (**self).query_items(query).await
    }
}

/// Produces a fresh catalog view for each scan
///
/// Live backends reload on every call so a recurring job never evaluates a
/// stale copy of the library.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn open(&self) -> Result<Arc<dyn CatalogSource>, CatalogError>;
}

/// Provider that hands out the same catalog every time
pub struct FixedCatalog {
    catalog: Arc<dyn CatalogSource>,
}

impl FixedCatalog {
    pub fn new(catalog: Arc<dyn CatalogSource>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl CatalogProvider for FixedCatalog {
    fn provider_name(&self) -> &str {
        self.catalog.source_name()
    }

    async fn open(&self) -> Result<Arc<dyn CatalogSource>, CatalogError> {
        Ok(self.catalog.clone())
    }
}
