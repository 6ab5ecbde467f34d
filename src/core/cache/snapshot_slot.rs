// Snapshot slot - one atomically swappable, versioned value.
//
// This is the publication primitive under both the collection cache and the
// moderation rule store. Readers load an Arc and never block; writers
// reserve a version, build the new value off to the side, then publish it.
// Publishing is highest-version-wins, so a slow writer holding an older
// version can never overwrite a newer value.

use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Versioned<T> {
    value: Arc<T>,
    version: u64,
}

pub struct SnapshotSlot<T> {
    current: ArcSwap<Versioned<T>>,
    versions: AtomicU64,
}

impl<T> SnapshotSlot<T> {
    /// Start with `initial` published as version 0.
    pub fn new(initial: T) -> Self {
        Self {
            current: ArcSwap::from_pointee(Versioned {
                value: Arc::new(initial),
                version: 0,
            }),
            versions: AtomicU64::new(0),
        }
    }

    /// The value published right now.
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.current.load().value)
    }

    /// Version of the value published right now.
    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Reserve the next version number. Every call returns a fresh one.
    pub fn next_version(&self) -> u64 {
        self.versions.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install `value` unless something newer is already published.
    /// Returns whether it was installed.
    pub fn publish(&self, version: u64, value: Arc<T>) -> bool {
        let previous = self.current.rcu(|current| {
            if current.version > version {
                Arc::clone(current)
            } else {
                Arc::new(Versioned {
                    value: Arc::clone(&value),
                    version,
                })
            }
        });
        previous.version <= version
    }

    /// Reserve a version and publish `value` under it.
    pub fn replace(&self, value: T) -> u64 {
        let version = self.next_version();
        self.publish(version, Arc::new(value));
        version
    }
}
