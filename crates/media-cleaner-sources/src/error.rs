use media_cleaner_models::{ItemId, ItemKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("failed to decode catalog response: {0}")]
    Decode(String),

    #[error("{kind} {id} has no parent")]
    Orphan { id: ItemId, kind: ItemKind },

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl CatalogError {
    pub fn other(message: impl Into<String>) -> Self {
        CatalogError::Other(message.into())
    }
}
