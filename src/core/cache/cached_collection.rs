// A GenericCache wired to its backing source through a RefreshCoordinator.
//
// Misses and explicit refreshes go to the source at most once at a time;
// a failed fetch leaves whatever the cache held before untouched.

use super::generic_cache::GenericCache;
use super::refresh_coordinator::{RefreshCoordinator, RefreshError};
use super::source::CollectionSource;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

pub struct CachedCollection<K, T, S> {
    source: Arc<S>,
    cache: Arc<GenericCache<K, T>>,
    coordinator: RefreshCoordinator<Arc<Vec<T>>>,
    timeout: Option<Duration>,
}

impl<K, T, S> CachedCollection<K, T, S>
where
    K: Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    S: CollectionSource<T> + 'static,
{
    pub fn new(source: S, key_fn: fn(&T) -> K, timeout: Option<Duration>) -> Self {
        Self {
            source: Arc::new(source),
            cache: Arc::new(GenericCache::new(key_fn)),
            coordinator: RefreshCoordinator::new(),
            timeout,
        }
    }

    /// Cached collection, loading it from the source on a miss.
    pub async fn get_all(&self) -> Result<Arc<Vec<T>>, RefreshError> {
        if let Some(items) = self.cache.get() {
            return Ok(items);
        }
        tracing::debug!("Cache miss, loading collection from source");
        self.refresh(self.timeout).await
    }

    /// Look up one item by identifier, loading the collection on a miss.
    pub async fn get_by_key(&self, key: &K) -> Result<Option<T>, RefreshError> {
        if self.cache.get().is_none() {
            self.refresh(self.timeout).await?;
        }
        Ok(self.cache.get_by_key(key))
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Only what is cached right now; never touches the source.
    pub fn peek(&self) -> Option<Arc<Vec<T>>> {
        self.cache.get()
    }

    pub fn set_all(&self, items: Vec<T>) -> u64 {
        self.cache.set(items)
    }

    pub fn clear_cache(&self) {
        self.cache.clear()
    }

    /// Fetch the whole collection again and replace the cached copy.
    pub async fn refresh(&self, timeout: Option<Duration>) -> Result<Arc<Vec<T>>, RefreshError> {
        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);

        self.coordinator
            .coordinate(
                move || async move {
                    let items = source
                        .fetch_all()
                        .await
                        .map_err(|e| RefreshError::BackingStore(e.to_string()))?;
                    let items = Arc::new(items);
                    let version = cache.set_shared(Arc::clone(&items));
                    tracing::info!(version, count = items.len(), "Collection cache refreshed");
                    Ok(items)
                },
                timeout,
            )
            .await
    }
}
