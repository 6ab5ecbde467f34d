// Storage ports for anything the caches are populated from.
//
// The core never talks to a database directly; it only knows these traits.
// Implementations live in infra/ (SQLite, JSON files, in-memory).

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A backing store that can hand over a whole collection of records at once.
#[async_trait]
pub trait CollectionSource<T>: Send + Sync {
    /// Fetch every record in the collection.
    async fn fetch_all(&self) -> Result<Vec<T>, StoreError>;
}
