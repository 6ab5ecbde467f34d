// Generic read-mostly cache - a single atomically swappable slot.
//
// Readers load one Arc and never block. Writers build a complete new entry
// and publish it through a SnapshotSlot, so a reader sees either the whole
// collection or nothing, and racing writers settle on the newest version.

use super::snapshot_slot::SnapshotSlot;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// A complete cached collection plus its identifier index.
#[derive(Debug)]
struct CacheEntry<K, V> {
    items: Arc<Vec<V>>,
    index: HashMap<K, usize>,
}

/// Cache for a whole collection keyed by identifier.
///
/// The slot holds `None` until the first `set` and again after a `clear`.
/// `key_fn` extracts the identifier used by [`GenericCache::get_by_key`].
pub struct GenericCache<K, V> {
    slot: SnapshotSlot<Option<CacheEntry<K, V>>>,
    key_fn: fn(&V) -> K,
}

impl<K, V> GenericCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(key_fn: fn(&V) -> K) -> Self {
        Self {
            slot: SnapshotSlot::new(None),
            key_fn,
        }
    }

    /// Current collection, if one has been stored. Never fetches.
    pub fn get(&self) -> Option<Arc<Vec<V>>> {
        let current = self.slot.load();
        (*current).as_ref().map(|entry| Arc::clone(&entry.items))
    }

    /// Look up a single item by identifier in the current collection.
    pub fn get_by_key(&self, key: &K) -> Option<V> {
        let current = self.slot.load();
        let entry = (*current).as_ref()?;
        entry
            .index
            .get(key)
            .and_then(|&i| entry.items.get(i))
            .cloned()
    }

    /// Replace the stored collection wholesale. Returns the new version.
    pub fn set(&self, items: Vec<V>) -> u64 {
        self.set_shared(Arc::new(items))
    }

    /// Like [`GenericCache::set`], for callers that keep a handle to the
    /// collection they stored.
    pub fn set_shared(&self, items: Arc<Vec<V>>) -> u64 {
        let index = items
            .iter()
            .enumerate()
            .map(|(i, item)| ((self.key_fn)(item), i))
            .collect();

        let version = self.slot.replace(Some(CacheEntry { items, index }));
        tracing::debug!(version, "Cache collection replaced");
        version
    }

    /// Drop the stored collection. `get()` returns `None` until the next `set`.
    pub fn clear(&self) {
        let version = self.slot.replace(None);
        tracing::debug!(version, "Cache cleared");
    }

    /// Version of the latest set/clear, 0 if the cache was never touched.
    pub fn version(&self) -> u64 {
        self.slot.version()
    }
}
